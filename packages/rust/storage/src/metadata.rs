//! Load/save of the per-key note metadata record.

use std::path::PathBuf;

use tracing::debug;

use notepin_shared::{NoteKey, NoteMetadata, NotepinError, Result};

use crate::{NotePaths, read_optional, write_json};

#[derive(Debug, Clone)]
pub struct MetadataStore {
    paths: NotePaths,
}

impl MetadataStore {
    pub fn new(paths: NotePaths) -> Self {
        Self { paths }
    }

    pub fn path(&self, key: &NoteKey) -> PathBuf {
        self.paths.metadata_file(key)
    }

    /// Load the record, `None` if the key has never been submitted.
    ///
    /// A record that exists but cannot be parsed is an error: overwriting it
    /// would drop every earlier entry.
    pub async fn load(&self, key: &NoteKey) -> Result<Option<NoteMetadata>> {
        let path = self.path(key);
        let content = read_optional(&path).await.map_err(|e| match e {
            NotepinError::Io { path, source } => {
                NotepinError::corrupt_metadata(path, source.to_string())
            }
            other => other,
        })?;
        let Some(content) = content else {
            return Ok(None);
        };

        let metadata = serde_json::from_str(&content)
            .map_err(|e| NotepinError::corrupt_metadata(&path, e.to_string()))?;
        Ok(Some(metadata))
    }

    /// Overwrite the record with `metadata`.
    pub async fn save(&self, key: &NoteKey, metadata: &NoteMetadata) -> Result<PathBuf> {
        let path = self.path(key);
        write_json(&path, metadata).await?;
        debug!(path = %path.display(), entries = metadata.entries.len(), "saved note metadata");
        Ok(path)
    }
}
