//! Flat-file storage layer for notepin.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <data_dir>/
//! ├── local-notes-cache/
//! │   └── session_<tag>_<title>.json   (pending chunks, see [`ChunkCache`])
//! ├── local-notes/
//! │   └── <tag>/
//! │       ├── <title>.json             (note metadata, see [`MetadataStore`])
//! │       └── <title>.docx             (exported document)
//! └── images/                          (screenshots, see [`ImageStore`])
//! ```
//!
//! **Access rules:** a single process owns the data directory. Files are
//! rewritten whole; metadata and documents go through [`write_atomic`].

mod cache;
mod images;
mod metadata;

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use notepin_shared::{AppConfig, NoteKey, NotepinError, Result};

pub use cache::{AppendReceipt, ChunkCache};
pub use images::ImageStore;
pub use metadata::MetadataStore;

const CACHE_DIR: &str = "local-notes-cache";
const NOTES_DIR: &str = "local-notes";

/// Resolves where each per-key file lives.
#[derive(Debug, Clone)]
pub struct NotePaths {
    data_dir: PathBuf,
    images_dir: PathBuf,
}

impl NotePaths {
    pub fn new(data_dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            images_dir: images_dir.into(),
        }
    }

    /// Layout rooted at `data_dir` with images in `<data_dir>/images`.
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let images_dir = data_dir.join("images");
        Self::new(data_dir, images_dir)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(config.data_dir()?, config.images_dir()?))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn cache_file(&self, key: &NoteKey) -> PathBuf {
        self.data_dir
            .join(CACHE_DIR)
            .join(format!("{}.json", key.cache_stem()))
    }

    pub fn notes_dir(&self, key: &NoteKey) -> PathBuf {
        self.data_dir.join(NOTES_DIR).join(key.safe_tag())
    }

    pub fn metadata_file(&self, key: &NoteKey) -> PathBuf {
        self.notes_dir(key)
            .join(format!("{}.json", key.safe_title()))
    }

    pub fn document_file(&self, key: &NoteKey) -> PathBuf {
        self.notes_dir(key)
            .join(format!("{}.docx", key.safe_title()))
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Serialize `data` as pretty JSON and write it atomically.
pub async fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| NotepinError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, json.as_bytes()).await?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write to a sibling temp file, fsync, then rename over `path`.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| NotepinError::persist(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| NotepinError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = tokio::fs::File::create(&temp)
        .await
        .map_err(|e| NotepinError::persist(&temp, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| NotepinError::persist(&temp, e))?;
    file.sync_all()
        .await
        .map_err(|e| NotepinError::persist(&temp, e))?;
    drop(file);

    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| NotepinError::persist(path, e))?;
    Ok(())
}

/// Read a file as UTF-8, returning `None` when it does not exist.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(NotepinError::io(path, e)),
    }
}
