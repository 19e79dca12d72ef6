//! Application context tying caches, metadata, images and submission together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::error;

use notepin_document::{DocumentRenderer, DocxRenderer};
use notepin_shared::{AppConfig, AppendOutcome, Chunk, NoteKey, NoteMetadata, Result, SubmitOutcome};
use notepin_storage::{AppendReceipt, ChunkCache, ImageStore, MetadataStore, NotePaths};

use crate::compiler::{SubmissionCompiler, SubmitReceipt};

/// Everything a front end needs, built once from [`AppConfig`] and passed around.
pub struct Notebook {
    config: AppConfig,
    paths: NotePaths,
    cache: ChunkCache,
    metadata: MetadataStore,
    images: ImageStore,
    compiler: SubmissionCompiler,
}

impl Notebook {
    /// Open the notebook described by `config`, exporting `.docx` files.
    pub fn open(config: AppConfig) -> Result<Self> {
        let paths = NotePaths::from_config(&config)?;
        Ok(Self::with_renderer(config, paths, Arc::new(DocxRenderer::new())))
    }

    /// Open with an explicit layout and document renderer.
    pub fn with_renderer(
        config: AppConfig,
        paths: NotePaths,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            cache: ChunkCache::new(paths.clone()),
            metadata: MetadataStore::new(paths.clone()),
            images: ImageStore::new(paths.images_dir()),
            compiler: SubmissionCompiler::new(paths.clone(), &config, renderer),
            paths,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        self.paths.data_dir()
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Resolve a caller-supplied tag/title pair.
    pub fn key(&self, tag: &str, title: &str) -> NoteKey {
        NoteKey::new(tag, title, &self.config.defaults)
    }

    pub async fn append(&self, tag: &str, title: &str, chunk: Chunk) -> Result<AppendReceipt> {
        self.cache.append(&self.key(tag, title), chunk).await
    }

    /// [`append`](Self::append), reported as a structured outcome.
    pub async fn append_outcome(&self, tag: &str, title: &str, chunk: Chunk) -> AppendOutcome {
        match self.append(tag, title, chunk).await {
            Ok(receipt) => AppendOutcome {
                success: true,
                file_path: Some(receipt.path),
                count: Some(receipt.count),
                error: None,
            },
            Err(e) => {
                error!(tag, title, error = %e, "failed to cache chunk");
                AppendOutcome {
                    success: false,
                    file_path: None,
                    count: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn count(&self, tag: &str, title: &str) -> usize {
        self.cache.count(&self.key(tag, title)).await
    }

    pub async fn submit(&self, tag: &str, title: &str, source: &str) -> Result<SubmitReceipt> {
        self.compiler.submit(&self.key(tag, title), source).await
    }

    pub async fn submit_outcome(&self, tag: &str, title: &str, source: &str) -> SubmitOutcome {
        self.compiler
            .submit_outcome(&self.key(tag, title), source)
            .await
    }

    /// The submitted record for a key, if any.
    pub async fn metadata(&self, tag: &str, title: &str) -> Result<Option<NoteMetadata>> {
        self.metadata.load(&self.key(tag, title)).await
    }

    /// Where the exported document for a key lives.
    pub fn document_path(&self, tag: &str, title: &str) -> PathBuf {
        self.paths.document_file(&self.key(tag, title))
    }
}
