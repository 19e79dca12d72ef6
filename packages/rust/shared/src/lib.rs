//! Shared types, error model, and configuration for notepin.
//!
//! This crate is the foundation depended on by all other notepin crates.
//! It provides:
//! - [`NotepinError`], the unified error type
//! - Domain types ([`Chunk`], [`NoteMetadata`], [`Entry`], [`NoteKey`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod key;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, DocumentConfig, DocumentLabels, StorageConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{NotepinError, Result};
pub use key::{NoteKey, sanitize};
pub use types::{
    AppendOutcome, Chunk, ChunkKind, Entry, NoteMetadata, Screenshot, SubmitOutcome,
};
