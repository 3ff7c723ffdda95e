//! Core type definitions for Folio.
//!
//! This crate defines the fundamental types shared by every layer of the
//! index reconciliation engine:
//! - Content-addressed keys for indexed files
//! - Library document identifiers
//! - Millisecond timestamps and the clock that produces them
//!
//! Bibliographic records, index entries and answers live in `folio-model`.

mod clock;
mod ids;
mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{ContentKey, DocumentId};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid content key: {0}")]
    InvalidContentKey(String),

    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
