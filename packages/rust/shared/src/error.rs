//! Error types for notepin.
//!
//! Library crates use [`NotepinError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all notepin operations.
#[derive(Debug, thiserror::Error)]
pub enum NotepinError {
    /// Nothing has been cached for the key.
    #[error("no pending notes to submit for {key}")]
    NoPendingData { key: String },

    /// The cache file exists but holds zero chunks.
    #[error("note cache for {key} is empty")]
    EmptyCache { key: String },

    /// The cache file could not be parsed as a chunk list.
    #[error("note cache at {path:?} is corrupt: {message}")]
    CorruptCache { path: PathBuf, message: String },

    /// The metadata record exists but could not be read or parsed.
    #[error("note metadata at {path:?} is corrupt: {message}")]
    CorruptMetadata { path: PathBuf, message: String },

    /// A write to disk failed.
    #[error("failed to write {path:?}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem read or delete error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Document serialization failed.
    #[error("render error: {0}")]
    Render(String),

    /// A referenced screenshot is not on disk. Only ever logged.
    #[error("image not found: {path:?}")]
    MissingImage { path: PathBuf },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Invalid caller input (bad filename, malformed data URL, ...).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NotepinError>;

impl NotepinError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a read/delete `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a failed write with the target path.
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt-cache error.
    pub fn corrupt_cache(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::CorruptCache {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a corrupt-metadata error.
    pub fn corrupt_metadata(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::CorruptMetadata {
            path: path.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = NotepinError::NoPendingData {
            key: "work/Q1".into(),
        };
        assert_eq!(err.to_string(), "no pending notes to submit for work/Q1");

        let err = NotepinError::validation("filename contains a path separator");
        assert!(err.to_string().contains("path separator"));
    }

    #[test]
    fn persist_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = NotepinError::persist("/tmp/x.json", source);
        let msg = err.to_string();
        assert!(msg.starts_with("failed to write"));
        assert!(msg.contains("x.json"));
    }
}
