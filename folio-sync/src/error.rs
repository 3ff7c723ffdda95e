//! Error types for the sync layer.

use folio_cite::CiteError;
use folio_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync pass or a query.
///
/// Per-file problems during a pass are not errors; they are collected in the
/// pass's [`SyncReport`](crate::SyncReport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The durable index could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration rejected before any work was done.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The retrieval engine failed to answer a query.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Citation rewriting could not be set up.
    #[error("citation error: {0}")]
    Cite(#[from] CiteError),

    /// IO error while reading the library.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("evidence_k ({evidence_k}) must be larger than max_sources ({max_sources})")]
    EvidenceNotAboveSources { evidence_k: usize, max_sources: usize },

    #[error("max_sources must be at least 1")]
    NoSources,

    #[error("no ingestible file extensions configured")]
    NoExtensions,

    #[error("blank field name in {0}")]
    BlankField(&'static str),

    #[error("cannot read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures reported by a [`RetrievalEngine`](crate::RetrievalEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// The engine could not make sense of the file's content.
    #[error("unrecognized content: {0}")]
    Unrecognized(String),

    /// Any other engine failure.
    #[error("retrieval backend error: {0}")]
    Backend(String),
}

/// A metadata provider failed to answer. Treated as "no contribution".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider}: {message}")]
pub struct ProviderError {
    pub provider: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
