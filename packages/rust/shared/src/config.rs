//! Application configuration for notepin.
//!
//! User config lives at `~/.notepin/notepin.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NotepinError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "notepin.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".notepin";

/// Directory name used under the platform data dir when none is configured.
const DATA_DIR_NAME: &str = "notepin";

// ---------------------------------------------------------------------------
// Config structs (matching notepin.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where caches, metadata, documents and images live.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Fallback literals for keys and entries.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Exported document layout.
    #[serde(default)]
    pub document: DocumentConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root data directory. Defaults to the platform data dir + `notepin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Screenshot directory. Defaults to `<data_dir>/images`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<String>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Tag used when the caller leaves it empty.
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Title used when the caller leaves it empty.
    #[serde(default = "default_title")]
    pub title: String,

    /// Entry source when neither the caller nor any chunk has one.
    #[serde(default = "default_no_source")]
    pub no_source_marker: String,

    /// Entry text when no chunk has content.
    #[serde(default = "default_empty_text")]
    pub empty_text_marker: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            title: default_title(),
            no_source_marker: default_no_source(),
            empty_text_marker: default_empty_text(),
        }
    }
}

fn default_tag() -> String {
    "default".into()
}
fn default_title() -> String {
    "untitled".into()
}
fn default_no_source() -> String {
    "none".into()
}
fn default_empty_text() -> String {
    "(empty)".into()
}

/// `[document]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Width screenshots are scaled to, in pixels.
    #[serde(default = "default_image_width")]
    pub image_width_px: u32,

    /// Fixed strings printed in the document.
    #[serde(default)]
    pub labels: DocumentLabels,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            image_width_px: default_image_width(),
            labels: DocumentLabels::default(),
        }
    }
}

fn default_image_width() -> u32 {
    320
}

/// `[document.labels]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLabels {
    #[serde(default = "default_created_label")]
    pub created: String,
    #[serde(default = "default_updated_label")]
    pub updated: String,
    #[serde(default = "default_entries_label")]
    pub entries: String,
    #[serde(default = "default_source_label")]
    pub source: String,
    #[serde(default = "default_text_label")]
    pub text: String,
}

impl Default for DocumentLabels {
    fn default() -> Self {
        Self {
            created: default_created_label(),
            updated: default_updated_label(),
            entries: default_entries_label(),
            source: default_source_label(),
            text: default_text_label(),
        }
    }
}

fn default_created_label() -> String {
    "Created".into()
}
fn default_updated_label() -> String {
    "Last edited".into()
}
fn default_entries_label() -> String {
    "Entries".into()
}
fn default_source_label() -> String {
    "Source".into()
}
fn default_text_label() -> String {
    "Text".into()
}

impl AppConfig {
    /// Resolve the root data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => expand_home(dir),
            None => {
                let base = dirs::data_dir().ok_or_else(|| {
                    NotepinError::config("could not determine platform data directory")
                })?;
                Ok(base.join(DATA_DIR_NAME))
            }
        }
    }

    /// Resolve the screenshot directory.
    pub fn images_dir(&self) -> Result<PathBuf> {
        match &self.storage.images_dir {
            Some(dir) => expand_home(dir),
            None => Ok(self.data_dir()?.join("images")),
        }
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(raw: &str) -> Result<PathBuf> {
    match raw.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| NotepinError::config("could not determine home directory"))?;
            Ok(home.join(rest.trim_start_matches(['/', '\\'])))
        }
        None => Ok(PathBuf::from(raw)),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.notepin/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NotepinError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.notepin/notepin.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NotepinError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NotepinError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NotepinError::persist(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| NotepinError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NotepinError::persist(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("image_width_px"));
        assert!(toml_str.contains("untitled"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.document.image_width_px, 320);
        assert_eq!(parsed.defaults.tag, "default");
        assert_eq!(parsed.defaults.no_source_marker, "none");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[storage]
data_dir = "/tmp/notepin-data"

[defaults]
title = "未命名"

[document.labels]
source = "来源"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.title, "未命名");
        assert_eq!(config.defaults.tag, "default");
        assert_eq!(config.document.labels.source, "来源");
        assert_eq!(config.document.labels.text, "Text");
        assert_eq!(
            config.data_dir().unwrap(),
            PathBuf::from("/tmp/notepin-data")
        );
        assert_eq!(
            config.images_dir().unwrap(),
            PathBuf::from("/tmp/notepin-data/images")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~/notes").unwrap(), home.join("notes"));
        assert_eq!(expand_home("/abs").unwrap(), PathBuf::from("/abs"));
    }
}
