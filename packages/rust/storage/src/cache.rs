//! Per-key cache of chunks waiting to be submitted.

use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use notepin_shared::{Chunk, NoteKey, NotepinError, Result};

use crate::{NotePaths, read_optional, write_json};

/// What an append produced.
#[derive(Debug, Clone)]
pub struct AppendReceipt {
    /// Cache file that now holds the chunk.
    pub path: PathBuf,
    /// Number of chunks cached for the key, including the new one.
    pub count: usize,
}

/// Ordered, whole-file JSON list of pending chunks per key.
#[derive(Debug, Clone)]
pub struct ChunkCache {
    paths: NotePaths,
}

impl ChunkCache {
    pub fn new(paths: NotePaths) -> Self {
        Self { paths }
    }

    pub fn path(&self, key: &NoteKey) -> PathBuf {
        self.paths.cache_file(key)
    }

    /// Stamp `chunk` with the current time and append it to the key's list.
    ///
    /// Existing elements are written back exactly as read. An unreadable file
    /// or a payload that is not a list is discarded, never an error. Only a
    /// failed write is reported.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn append(&self, key: &NoteKey, mut chunk: Chunk) -> Result<AppendReceipt> {
        let path = self.path(key);
        let mut chunks = self.read_lenient(key).await;

        chunk.timestamp = Some(Utc::now());
        let value = serde_json::to_value(&chunk)
            .map_err(|e| NotepinError::validation(format!("JSON serialization failed: {e}")))?;
        chunks.push(value);

        write_json(&path, &chunks).await?;
        info!(count = chunks.len(), path = %path.display(), "cached chunk");

        Ok(AppendReceipt {
            path,
            count: chunks.len(),
        })
    }

    /// Number of pending chunks; 0 when absent or unreadable.
    pub async fn count(&self, key: &NoteKey) -> usize {
        self.read_lenient(key).await.len()
    }

    /// Delete the key's cache. A missing file counts as cleared.
    pub async fn clear(&self, key: &NoteKey) -> Result<()> {
        let path = self.path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "cleared chunk cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NotepinError::io(&path, e)),
        }
    }

    /// Strict read used at submission time.
    ///
    /// Distinguishes a missing cache, a corrupt one and an empty one.
    pub async fn load(&self, key: &NoteKey) -> Result<Vec<Chunk>> {
        let path = self.path(key);
        let content = read_optional(&path)
            .await?
            .ok_or_else(|| NotepinError::NoPendingData {
                key: key.to_string(),
            })?;

        let payload: Value = serde_json::from_str(&content)
            .map_err(|e| NotepinError::corrupt_cache(&path, e.to_string()))?;
        let Value::Array(items) = payload else {
            return Err(NotepinError::corrupt_cache(&path, "expected a list of chunks"));
        };

        if items.is_empty() {
            return Err(NotepinError::EmptyCache {
                key: key.to_string(),
            });
        }
        Ok(items.into_iter().enumerate().map(decode_chunk).collect())
    }

    /// The raw list elements; empty when absent, unreadable or not a list.
    async fn read_lenient(&self, key: &NoteKey) -> Vec<Value> {
        let path = self.path(key);
        let content = match read_optional(&path).await {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read chunk cache, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!(path = %path.display(), "chunk cache is not a list, treating as empty");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "chunk cache is malformed, treating as empty");
                Vec::new()
            }
        }
    }
}

/// An element that is not a chunk object contributes an empty chunk.
fn decode_chunk((index, item): (usize, Value)) -> Chunk {
    serde_json::from_value(item).unwrap_or_else(|e| {
        warn!(index, error = %e, "unreadable cached chunk, using an empty one");
        Chunk::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{key, temp_dir};
    use notepin_shared::Screenshot;

    fn cache_in(dir: &std::path::Path) -> ChunkCache {
        ChunkCache::new(NotePaths::rooted_at(dir))
    }

    #[tokio::test]
    async fn count_matches_number_of_appends() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");

        assert_eq!(cache.count(&key).await, 0);
        for n in 1..=5 {
            let receipt = cache
                .append(&key, Chunk::text(format!("note {n}"), ""))
                .await
                .unwrap();
            assert_eq!(receipt.count, n);
            assert_eq!(cache.count(&key).await, n);
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn append_stamps_timestamp_and_keeps_order() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");

        let chunk = Chunk::text("first", "siteA")
            .with_screenshot(Screenshot::new("a.png", ""))
            .with_screenshot(Screenshot::new("b.png", ""));
        cache.append(&key, chunk).await.unwrap();
        cache.append(&key, Chunk::text("second", "")).await.unwrap();

        let chunks = cache.load(&key).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "first");
        assert_eq!(chunks[1].content, "second");
        assert!(chunks.iter().all(|c| c.timestamp.is_some()));
        assert_eq!(chunks[0].screenshots[0].filename, "a.png");
        assert_eq!(chunks[0].screenshots[1].filename, "b.png");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn keys_do_not_share_caches() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);

        cache.append(&key("work", "Q1"), Chunk::text("a", "")).await.unwrap();
        cache.append(&key("work", "Q2"), Chunk::text("b", "")).await.unwrap();
        cache.append(&key("work", "Q2"), Chunk::text("c", "")).await.unwrap();

        assert_eq!(cache.count(&key("work", "Q1")).await, 1);
        assert_eq!(cache.count(&key("work", "Q2")).await, 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn corrupt_cache_is_reset_on_append() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");
        let path = cache.path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(cache.count(&key).await, 0);
        let receipt = cache.append(&key, Chunk::text("fresh", "")).await.unwrap();
        assert_eq!(receipt.count, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn non_list_payload_counts_as_empty() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");
        let path = cache.path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"content": "not a list"}"#).unwrap();

        assert_eq!(cache.count(&key).await, 0);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn odd_elements_are_counted_and_kept_on_append() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");
        let path = cache.path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"[
                {"type":"text","content":"keep me","source":"siteA","pinned":true},
                {"type":"sketch","content":null,"screenshots":null,"timestamp":"soon"}
            ]"#,
        )
        .unwrap();

        assert_eq!(cache.count(&key).await, 2);
        let receipt = cache.append(&key, Chunk::text("new", "")).await.unwrap();
        assert_eq!(receipt.count, 3);

        let on_disk: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 3);
        assert_eq!(on_disk[0]["content"], "keep me");
        assert_eq!(on_disk[0]["pinned"], true);
        assert_eq!(on_disk[1]["type"], "sketch");

        let chunks = cache.load(&key).await.unwrap();
        assert_eq!(chunks[0].source, "siteA");
        assert_eq!(chunks[1].kind, notepin_shared::ChunkKind::Other);
        assert!(chunks[1].content.is_empty() && chunks[1].timestamp.is_none());
        assert_eq!(chunks[2].content, "new");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn non_object_elements_load_as_empty_chunks() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");
        let path = cache.path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"[42, {"content":"real"}]"#).unwrap();

        assert_eq!(cache.count(&key).await, 2);
        let chunks = cache.load(&key).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.is_empty());
        assert_eq!(chunks[1].content, "real");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn load_distinguishes_missing_empty_and_corrupt() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");

        let err = cache.load(&key).await.unwrap_err();
        assert!(matches!(err, NotepinError::NoPendingData { .. }));

        let path = cache.path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        std::fs::write(&path, "[]").unwrap();
        let err = cache.load(&key).await.unwrap_err();
        assert!(matches!(err, NotepinError::EmptyCache { .. }));

        std::fs::write(&path, "\"just a string\"").unwrap();
        let err = cache.load(&key).await.unwrap_err();
        assert!(matches!(err, NotepinError::CorruptCache { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let tmp = temp_dir();
        let cache = cache_in(&tmp);
        let key = key("work", "Q1");

        cache.append(&key, Chunk::text("x", "")).await.unwrap();
        cache.clear(&key).await.unwrap();
        cache.clear(&key).await.unwrap();

        assert_eq!(cache.count(&key).await, 0);
        assert!(!cache.path(&key).exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
