//! Screenshot files referenced by chunks.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::Utc;
use tracing::{debug, info};

use notepin_shared::{NotepinError, Result};

use crate::write_atomic;

/// Standard alphabet, padding optional, as browsers and `FileReader` produce.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Flat directory of screenshots, addressed by file name.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `filename` inside the store.
    ///
    /// `None` for a name that is empty or would leave the directory.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        validate_filename(filename).ok()?;
        Some(self.dir.join(filename))
    }

    /// Decode a pasted `data:image/...;base64,` URL (or bare base64) and store it.
    pub async fn save_data_url(&self, data_url: &str, filename: &str) -> Result<PathBuf> {
        let payload = strip_data_url_prefix(data_url);
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = LENIENT_BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| NotepinError::validation(format!("invalid base64 image data: {e}")))?;
        self.save_bytes(filename, &bytes).await
    }

    /// Store raw image bytes under `filename`, overwriting any previous file.
    pub async fn save_bytes(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        validate_filename(filename)?;
        let path = self.dir.join(filename);
        write_atomic(&path, bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "saved image");
        Ok(path)
    }

    /// Copy an image file into the store as `image_<millis>.<ext>`.
    ///
    /// Returns the stored file name and its path.
    pub async fn import(&self, source: &Path) -> Result<(String, PathBuf)> {
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| NotepinError::io(source, e))?;
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "png".to_string());

        let mut stamp = Utc::now().timestamp_millis();
        let filename = loop {
            let candidate = format!("image_{stamp}.{ext}");
            let exists = tokio::fs::try_exists(self.dir.join(&candidate))
                .await
                .map_err(|e| NotepinError::io(&self.dir, e))?;
            if !exists {
                break candidate;
            }
            stamp += 1;
        };

        let path = self.save_bytes(&filename, &bytes).await?;
        Ok((filename, path))
    }

    /// Read an image file back as a `data:` URL.
    pub async fn read_data_url(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| NotepinError::io(path, e))?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let subtype = match ext.as_str() {
            "jpg" => "jpeg",
            "" => "png",
            other => other,
        };
        Ok(format!(
            "data:image/{subtype};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }

    /// Bytes of a stored image, `None` if the file is gone or the name is not
    /// a plain file name.
    pub async fn load(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(filename) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "image not on disk");
                Ok(None)
            }
            Err(e) => Err(NotepinError::io(&path, e)),
        }
    }
}

/// Drop a leading `data:image/<kind>;base64,` if present.
fn strip_data_url_prefix(data_url: &str) -> &str {
    if let Some(rest) = data_url.strip_prefix("data:image/") {
        if let Some((kind, payload)) = rest.split_once(";base64,") {
            if !kind.is_empty() && kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return payload;
            }
        }
    }
    data_url
}

/// Reject names that would escape the image directory.
fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() || filename == "." || filename == ".." {
        return Err(NotepinError::validation(format!(
            "invalid image filename: {filename:?}"
        )));
    }
    if filename.contains(['/', '\\', '\0']) {
        return Err(NotepinError::validation(format!(
            "image filename must not contain path separators: {filename:?}"
        )));
    }
    Ok(())
}
