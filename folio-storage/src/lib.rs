//! Index storage layer for Folio.
//!
//! Persists the derived index as one JSON snapshot per library.
//!
//! # Architecture
//!
//! - [`IndexSnapshot`] is the in-memory index: content key → [`IndexEntry`]
//! - [`IndexStore`] loads and saves snapshots as whole-file replacements
//! - Every snapshot carries a schema version; a mismatch fails loudly instead
//!   of being reinterpreted
//!
//! [`IndexEntry`]: folio_model::IndexEntry

mod error;
mod index_store;
mod snapshot;

pub use error::{StorageError, StorageResult};
pub use index_store::{default_cache_dir, IndexStore, INDEX_FILE_SUFFIX};
pub use snapshot::{IndexSnapshot, PathIndex, SCHEMA_VERSION};
