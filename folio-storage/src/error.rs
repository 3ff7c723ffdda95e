//! Error types for the storage layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (file system).
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot content could not be parsed.
    #[error("corrupt index snapshot {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot written by an incompatible schema.
    #[error("index snapshot schema mismatch: found version {found}, expected {expected}")]
    SchemaMismatch { found: u32, expected: u32 },

    /// Serialization error while writing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No cache directory could be determined.
    #[error("no cache directory available")]
    NoCacheDir,

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
