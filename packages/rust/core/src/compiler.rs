//! Submission: cached chunks → metadata entry → exported document.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use notepin_document::DocumentRenderer;
use notepin_shared::{
    AppConfig, Chunk, DefaultsConfig, DocumentConfig, NoteKey, NoteMetadata, NotepinError, Result,
    SubmitOutcome,
};
use notepin_storage::{ChunkCache, ImageStore, MetadataStore, NotePaths, write_atomic};

use crate::entry::build_entry;
use crate::layout::{document_blocks, load_images};

/// Output from a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// The exported document.
    pub docx_path: PathBuf,
    /// The updated metadata record.
    pub metadata_path: PathBuf,
    /// Entries in the record after this submission.
    pub entry_count: usize,
}

/// Flushes a key's chunk cache into its metadata record and document.
pub struct SubmissionCompiler {
    paths: NotePaths,
    cache: ChunkCache,
    metadata: MetadataStore,
    images: ImageStore,
    defaults: DefaultsConfig,
    document: DocumentConfig,
    renderer: Arc<dyn DocumentRenderer>,
}

impl SubmissionCompiler {
    pub fn new(paths: NotePaths, config: &AppConfig, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            cache: ChunkCache::new(paths.clone()),
            metadata: MetadataStore::new(paths.clone()),
            images: ImageStore::new(paths.images_dir()),
            paths,
            defaults: config.defaults.clone(),
            document: config.document.clone(),
            renderer,
        }
    }

    /// Submit everything cached for `key`.
    ///
    /// 1. Load the chunk cache (must exist, parse, and be non-empty)
    /// 2. Load or create the metadata record and append one entry
    /// 3. Render the whole record
    /// 4. Persist metadata, then the document
    /// 5. Clear the cache
    ///
    /// The document is rendered before anything is written, so a render
    /// failure leaves both the cache and the record untouched.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn submit(&self, key: &NoteKey, source: &str) -> Result<SubmitReceipt> {
        let chunks = self.cache.load(key).await?;
        let existing = self.metadata.load(key).await?;

        let now = Utc::now();
        let metadata = fold_submission(existing, key, source, &chunks, &self.defaults, now);

        let document = self.render(&metadata).await?;

        let metadata_path = self.metadata.save(key, &metadata).await?;
        let docx_path = self.paths.document_file(key);
        write_atomic(&docx_path, &document).await?;

        self.cache.clear(key).await?;

        info!(
            chunks = chunks.len(),
            entries = metadata.entries.len(),
            path = %docx_path.display(),
            "submitted notes"
        );

        Ok(SubmitReceipt {
            docx_path,
            metadata_path,
            entry_count: metadata.entries.len(),
        })
    }

    /// [`submit`](Self::submit), reported as a structured outcome.
    pub async fn submit_outcome(&self, key: &NoteKey, source: &str) -> SubmitOutcome {
        match self.submit(key, source).await {
            Ok(receipt) => SubmitOutcome::ok(receipt.docx_path),
            Err(e) => {
                error!(key = %key, error = %e, "submission failed");
                SubmitOutcome::failed(e.to_string())
            }
        }
    }

    /// Render an entire metadata record to document bytes.
    pub async fn render(&self, metadata: &NoteMetadata) -> Result<Vec<u8>> {
        let images = load_images(metadata, &self.images).await?;
        let blocks = document_blocks(metadata, &self.document, &self.defaults, &images);

        let renderer = Arc::clone(&self.renderer);
        tokio::task::spawn_blocking(move || renderer.render(&blocks))
            .await
            .map_err(|e| NotepinError::Render(format!("render task failed: {e}")))?
    }
}

/// Append one entry for `chunks` to `existing` (or a fresh record).
pub fn fold_submission(
    existing: Option<NoteMetadata>,
    key: &NoteKey,
    source: &str,
    chunks: &[Chunk],
    defaults: &DefaultsConfig,
    now: DateTime<Utc>,
) -> NoteMetadata {
    let mut metadata = existing.unwrap_or_else(|| NoteMetadata {
        tag: key.tag().to_string(),
        title: key.title().to_string(),
        created_at: chunks.first().and_then(|c| c.timestamp).unwrap_or(now),
        updated_at: now,
        entries: Vec::new(),
    });

    metadata.entries.push(build_entry(source, chunks, defaults, now));

    if metadata.tag.is_empty() {
        metadata.tag = key.tag().to_string();
    }
    if metadata.title.is_empty() {
        metadata.title = key.title().to_string();
    }
    if metadata.created_at == DateTime::<Utc>::UNIX_EPOCH {
        metadata.created_at = metadata
            .entries
            .iter()
            .map(|e| e.created_at)
            .filter(|ts| *ts != DateTime::<Utc>::UNIX_EPOCH)
            .min()
            .unwrap_or(now);
    }
    metadata.updated_at = now;

    metadata
}
