//! Sync engine: computes and applies one reconciliation pass.
//!
//! A pass loads the index snapshot once, plans, applies the plan
//! sequentially against the retrieval engine and saves the snapshot once.
//! Per-file failures are recorded in the [`SyncReport`] and never abort the
//! pass; storage failures do.

use crate::ask;
use crate::config::{QueryConfig, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::library::LibrarySnapshot;
use crate::merge::{carry_forward, merge, merge_into, restrict_fields};
use crate::plan::{plan, DeletionReason, PlannedFile, SyncPlan};
use crate::provider::{DetailQuery, LibraryProvider, MetadataProvider};
use crate::retrieval::{IngestRequest, RetrievalEngine};
use folio_cite::CitedAnswer;
use folio_model::{DocumentDetail, IndexEntry, LibraryDocument};
use folio_storage::{IndexSnapshot, IndexStore};
use folio_types::{Clock, ContentKey, SystemClock};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The step of a pass at which an item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Delete,
    Ingest,
    Metadata,
}

/// One item a pass could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub stage: FailureStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_key: Option<ContentKey>,
    pub reason: String,
}

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub ingested: usize,
    pub metadata_updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Returns true if every planned item succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of index changes made.
    pub fn changes(&self) -> usize {
        self.ingested + self.metadata_updated + self.deleted
    }

    fn fail(&mut self, stage: FailureStage, path: Option<&Path>, key: Option<&ContentKey>, reason: impl Into<String>) {
        let failure = SyncFailure {
            stage,
            path: path.map(Path::to_path_buf),
            content_key: key.cloned(),
            reason: reason.into(),
        };
        warn!(
            "Sync {:?} failed for {}: {}",
            failure.stage,
            failure
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .or_else(|| failure.content_key.as_ref().map(|k| k.to_string()))
                .unwrap_or_default(),
            failure.reason
        );
        self.failures.push(failure);
    }
}

/// Keeps one library's derived index in step with the library.
pub struct SyncEngine {
    config: SyncConfig,
    store: IndexStore,
    retrieval: Arc<dyn RetrievalEngine>,
    enrichers: Vec<Arc<dyn MetadataProvider>>,
    clock: Arc<dyn Clock>,
}

impl SyncEngine {
    /// Creates an engine without enrichment providers, on the system clock.
    pub fn new(config: SyncConfig, store: IndexStore, retrieval: Arc<dyn RetrievalEngine>) -> Self {
        Self {
            config,
            store,
            retrieval,
            enrichers: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Adds an enrichment provider. Providers are consulted in the order
    /// they were added.
    #[must_use]
    pub fn with_enricher(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.enrichers.push(provider);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Runs one pass with the library as primary metadata provider.
    pub async fn sync(&self, library: &LibrarySnapshot, force: bool) -> SyncResult<SyncReport> {
        let primary = LibraryProvider::from_snapshot(library);
        self.sync_with(library, &primary, force).await
    }

    /// Runs one pass with an explicit primary metadata provider.
    pub async fn sync_with(
        &self,
        library: &LibrarySnapshot,
        primary: &dyn MetadataProvider,
        force: bool,
    ) -> SyncResult<SyncReport> {
        self.config.validate()?;

        let mut index = self.store.load_or_empty()?;
        debug!("The index contains {} document(s)", index.len());
        debug!("The library contains {} document(s)", library.documents().len());

        let plan = plan(library, &index, force, &self.config);
        info!("{} file(s) will be indexed", plan.ingest.len());
        info!("{} file(s) will have their metadata updated", plan.update_metadata.len());
        info!("{} file(s) will be deleted from the index", plan.delete.len());

        let report = self.apply(&plan, library, &mut index, primary).await;
        if let Err(e) = self.store.save(&index) {
            error!("Failed to save index: {}", e);
            return Err(SyncError::Storage(e));
        }

        info!(
            "Sync finished: {} indexed, {} updated, {} deleted, {} unchanged, {} failed",
            report.ingested,
            report.metadata_updated,
            report.deleted,
            report.unchanged,
            report.failures.len()
        );
        Ok(report)
    }

    /// Applies a plan to `index`: deletions (malformed, stale content,
    /// removed), then ingestions, then metadata refreshes.
    pub async fn apply(
        &self,
        plan: &SyncPlan,
        library: &LibrarySnapshot,
        index: &mut IndexSnapshot,
        primary: &dyn MetadataProvider,
    ) -> SyncReport {
        let mut report = SyncReport {
            unchanged: plan.unchanged,
            ..Default::default()
        };

        for reason in [
            DeletionReason::Malformed,
            DeletionReason::StaleContent,
            DeletionReason::Removed,
        ] {
            for (key, deletion) in plan.deletions(reason) {
                if reason == DeletionReason::Malformed {
                    warn!("Removing document '{}' from index because it has no file location", key);
                }
                self.delete(key, deletion.path.as_deref(), reason, index, &mut report).await;
            }
        }

        let total = plan.ingest.len();
        for (n, file) in plan.ingest.iter().enumerate() {
            self.ingest(n + 1, total, file, library, index, primary, &mut report).await;
        }

        let total = plan.update_metadata.len();
        for (n, file) in plan.update_metadata.iter().enumerate() {
            self.refresh(n + 1, total, file, library, index, primary, &mut report).await;
        }

        report
    }

    /// Answers a question from this engine's index.
    pub async fn ask(&self, question: &str, config: &QueryConfig) -> SyncResult<Option<CitedAnswer>> {
        ask::ask(&self.store, self.retrieval.as_ref(), question, config).await
    }

    async fn delete(
        &self,
        key: &ContentKey,
        path: Option<&Path>,
        reason: DeletionReason,
        index: &mut IndexSnapshot,
        report: &mut SyncReport,
    ) {
        if let Err(e) = self.retrieval.remove(key).await {
            report.fail(FailureStage::Delete, path, Some(key), e.to_string());
        }
        if index.remove(key).is_some() {
            report.deleted += 1;
            match path {
                Some(path) => info!("Removing from index ({}): {}", reason, path.display()),
                None => debug!("Removed {} ({})", key.short(), reason),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn ingest(
        &self,
        n: usize,
        total: usize,
        file: &PlannedFile,
        library: &LibrarySnapshot,
        index: &mut IndexSnapshot,
        primary: &dyn MetadataProvider,
        report: &mut SyncReport,
    ) {
        let path = file.path.as_path();
        let Some(document) = library.document(&file.document_id) else {
            report.fail(FailureStage::Ingest, Some(path), None, "document not in library");
            return;
        };

        let indexed_at = self.clock.now();
        let key = match hash_file(path).await {
            Ok(key) => key,
            Err(reason) => {
                report.fail(FailureStage::Ingest, Some(path), None, reason);
                return;
            }
        };
        if let Some(existing) = index.get(&key) {
            let other = existing
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            report.fail(
                FailureStage::Ingest,
                Some(path),
                Some(&key),
                format!("same content is already indexed as {other}"),
            );
            return;
        }

        let citation = document.citation_token();
        let request = IngestRequest {
            path: path.to_path_buf(),
            content_key: key.clone(),
            docname: citation.clone(),
            citation: citation.clone(),
        };
        let docname = match self.retrieval.ingest(request).await {
            Ok(docname) => docname,
            Err(e) => {
                report.fail(FailureStage::Ingest, Some(path), Some(&key), e.to_string());
                return;
            }
        };

        let enrich = self.config.enrichment.on_ingest();
        let Some(detail) = self
            .build_detail(document, path, &key, &docname, primary, enrich, None)
            .await
        else {
            if let Err(e) = self.retrieval.remove(&key).await {
                warn!("Failed to roll back {}: {}", path.display(), e);
            }
            report.fail(FailureStage::Ingest, Some(path), Some(&key), "no metadata for document");
            return;
        };

        index.insert(IndexEntry {
            content_key: key,
            file_path: Some(path.to_path_buf()),
            document_id: Some(document.id.clone()),
            docname,
            citation: citation.clone(),
            detail,
            file_last_indexed: indexed_at,
            metadata_last_updated: indexed_at,
        });
        report.ingested += 1;
        info!("{}/{}: Indexed {} ({})", n, total, citation, file_name(path));
    }

    #[allow(clippy::too_many_arguments)]
    async fn refresh(
        &self,
        n: usize,
        total: usize,
        file: &PlannedFile,
        library: &LibrarySnapshot,
        index: &mut IndexSnapshot,
        primary: &dyn MetadataProvider,
        report: &mut SyncReport,
    ) {
        let path = file.path.as_path();
        let Some(entry) = index.find_by_path(path) else {
            report.fail(FailureStage::Metadata, Some(path), None, "file is not in the index");
            return;
        };
        let key = entry.content_key.clone();
        let docname = entry.docname.clone();
        let enrich = self.config.enrichment.on_refresh();
        let previous = (!enrich && self.config.enrichment.on_ingest()).then(|| entry.detail.clone());
        let Some(document) = library.document(&file.document_id) else {
            report.fail(FailureStage::Metadata, Some(path), Some(&key), "document not in library");
            return;
        };

        let refreshed_at = self.clock.now();
        let Some(detail) = self
            .build_detail(document, path, &key, &docname, primary, enrich, previous.as_ref())
            .await
        else {
            report.fail(FailureStage::Metadata, Some(path), Some(&key), "no metadata for document");
            return;
        };

        let citation = document.citation_token();
        if let Some(entry) = index.get_mut(&key) {
            entry.detail = detail;
            entry.citation = citation.clone();
            entry.document_id = Some(document.id.clone());
            entry.metadata_last_updated = refreshed_at;
            report.metadata_updated += 1;
            info!("{}/{}: Updated metadata for {} ({})", n, total, citation, file_name(path));
        }
    }

    /// Queries the primary provider and, if `enrich`, every enricher, then
    /// merges. Without enrichment, what `previous` got from earlier enrichers
    /// fills the remaining gaps. `None` when the primary has no record.
    #[allow(clippy::too_many_arguments)]
    async fn build_detail(
        &self,
        document: &LibraryDocument,
        path: &Path,
        key: &ContentKey,
        docname: &str,
        primary: &dyn MetadataProvider,
        enrich: bool,
        previous: Option<&DocumentDetail>,
    ) -> Option<DocumentDetail> {
        let query = DetailQuery::for_document(document.id.clone(), path);
        let base = match primary.query(&query).await {
            Ok(Some(detail)) => detail,
            Ok(None) => return None,
            Err(e) => {
                warn!("Primary metadata lookup failed for {}: {}", path.display(), e);
                return None;
            }
        };

        let mut secondaries = Vec::new();
        if enrich {
            let fields = &self.config.enrichment_fields;
            let query = DetailQuery::enrichment(&base, fields);
            for provider in &self.enrichers {
                match provider.query(&query).await {
                    Ok(Some(detail)) => secondaries.push(restrict_fields(detail, fields)),
                    Ok(None) => debug!("{} has nothing for {}", provider.name(), path.display()),
                    Err(e) => warn!("Metadata lookup failed: {}", e),
                }
            }
        }

        let mut detail = merge(base, secondaries, &self.config.overwrite_fields);
        if let Some(previous) = previous {
            let carried = carry_forward(previous, &self.config.enrichment_fields, &detail);
            merge_into(&mut detail, carried, &BTreeSet::new());
        }
        detail.doc_id = Some(key.clone());
        detail.docname = Some(docname.to_string());
        detail.key = Some(docname.to_string());
        Some(detail)
    }
}

async fn hash_file(path: &Path) -> Result<ContentKey, String> {
    let owned = path.to_path_buf();
    match tokio::task::spawn_blocking(move || ContentKey::from_file(&owned)).await {
        Ok(Ok(key)) => Ok(key),
        Ok(Err(e)) => Err(format!("cannot read file: {e}")),
        Err(e) => Err(format!("hashing task failed: {e}")),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
