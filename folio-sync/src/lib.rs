//! Incremental index reconciliation for Folio.
//!
//! Keeps a retrieval engine's document index in step with a document
//! library, and assembles one authoritative metadata record per indexed
//! file from the library and any number of enrichment providers.
//!
//! # Sync pass
//!
//! 1. **Load**: read the index snapshot from the [`IndexStore`](folio_storage::IndexStore)
//! 2. **Plan**: classify every library file (see [`Staleness`]) and decide
//!    what to ingest, refresh and delete ([`SyncPlan`])
//! 3. **Apply**: delete, ingest, then refresh metadata, one file at a time;
//!    every ingestion and refresh runs the [`merge`] policy
//! 4. **Save**: persist the snapshot once
//!
//! Per-file failures are collected in the [`SyncReport`]; storage failures
//! abort the pass.
//!
//! # Example
//!
//! ```no_run
//! use folio_model::LibraryDocument;
//! use folio_storage::IndexStore;
//! use folio_sync::retrieval::mock::MockRetrieval;
//! use folio_sync::{LibrarySnapshot, SyncConfig, SyncEngine};
//! use folio_types::DocumentId;
//! use std::sync::Arc;
//!
//! # async fn run() -> folio_sync::SyncResult<()> {
//! let doc = LibraryDocument::new(DocumentId::new("a1").unwrap())
//!     .with_file("/papers/smith.pdf")
//!     .with_field("ref", "smith2020");
//! let library = LibrarySnapshot::capture("papers", [doc]).await?;
//!
//! let engine = SyncEngine::new(
//!     SyncConfig::default(),
//!     IndexStore::for_library("papers")?,
//!     Arc::new(MockRetrieval::new()),
//! );
//! let report = engine.sync(&library, false).await?;
//! println!("{} indexed", report.ingested);
//! # Ok(())
//! # }
//! ```

mod ask;
pub mod config;
mod engine;
mod error;
mod library;
pub mod merge;
pub mod plan;
pub mod provider;
pub mod retrieval;
pub mod staleness;

pub use ask::ask;
pub use config::{EnrichmentPolicy, QueryConfig, SyncConfig};
pub use engine::{FailureStage, SyncEngine, SyncFailure, SyncReport};
pub use error::{ConfigError, ProviderError, RetrievalError, SyncError, SyncResult};
pub use library::{LibraryFile, LibrarySnapshot};
pub use merge::merge;
pub use plan::{plan, Deletion, DeletionReason, PlannedFile, SyncPlan};
pub use provider::{
    bibtex_type, DetailQuery, JournalQualityProvider, LibraryProvider, MetadataProvider,
    ProviderResult,
};
pub use retrieval::{IngestRequest, QueryOptions, RetrievalEngine};
pub use staleness::{classify, Staleness};
