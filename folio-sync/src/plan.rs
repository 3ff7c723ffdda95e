//! Planning a sync pass.
//!
//! A plan is computed from the library snapshot and the index snapshot
//! alone and has no side effects. Applying it is the engine's job.

use crate::config::SyncConfig;
use crate::library::LibrarySnapshot;
use crate::staleness::{classify, Staleness};
use folio_storage::IndexSnapshot;
use folio_types::{ContentKey, DocumentId, Timestamp};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A library file scheduled for ingestion or metadata refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub document_id: DocumentId,
    pub modified: Timestamp,
}

/// Why an index entry is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionReason {
    /// The entry lacks a source path, or lost its path to a newer entry.
    Malformed,
    /// The file changed and is being reingested under a new key.
    StaleContent,
    /// The file is no longer in the library.
    Removed,
}

impl fmt::Display for DeletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeletionReason::Malformed => "malformed",
            DeletionReason::StaleContent => "stale content",
            DeletionReason::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// An index entry scheduled for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deletion {
    pub reason: DeletionReason,
    /// The entry's recorded path, if it has one.
    pub path: Option<PathBuf>,
}

/// The decisions of one sync pass.
///
/// `ingest` and `update_metadata` are disjoint. Deletions are keyed by
/// content key, so no entry is deleted twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub ingest: Vec<PlannedFile>,
    pub update_metadata: Vec<PlannedFile>,
    pub delete: BTreeMap<ContentKey, Deletion>,
    pub unchanged: usize,
}

impl SyncPlan {
    /// Returns true if applying the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.ingest.is_empty() && self.update_metadata.is_empty() && self.delete.is_empty()
    }

    /// Deletions with the given reason, in key order.
    pub fn deletions(&self, reason: DeletionReason) -> impl Iterator<Item = (&ContentKey, &Deletion)> {
        self.delete.iter().filter(move |(_, d)| d.reason == reason)
    }

    pub fn deletion_count(&self, reason: DeletionReason) -> usize {
        self.deletions(reason).count()
    }

    fn schedule_deletion(&mut self, key: ContentKey, reason: DeletionReason, path: Option<PathBuf>) {
        self.delete.entry(key).or_insert(Deletion { reason, path });
    }
}

/// Computes the plan for one pass.
pub fn plan(
    library: &LibrarySnapshot,
    index: &IndexSnapshot,
    force: bool,
    config: &SyncConfig,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    // 1. Path lookup; entries that cannot own a path are deleted.
    let paths = index.path_index();
    for key in &paths.malformed {
        let path = index.get(key).and_then(|e| e.file_path.clone());
        plan.schedule_deletion(key.clone(), DeletionReason::Malformed, path);
    }

    // 2. Classify every ingestible file.
    let mut on_disk: HashSet<&Path> = HashSet::new();
    let mut ingesting: HashSet<&Path> = HashSet::new();
    for file in library.files() {
        if !config.is_ingestible(file.path) || !on_disk.insert(file.path) {
            continue;
        }

        let indexed = paths.key_for(file.path).and_then(|key| index.get(key));
        let staleness = classify(file.modified, file.document, indexed, force);
        debug!("{} is {}", file.path.display(), staleness);

        let planned = || PlannedFile {
            path: file.path.to_path_buf(),
            document_id: file.document.id.clone(),
            modified: file.modified,
        };
        match staleness {
            Staleness::Unseen | Staleness::ContentStale => {
                ingesting.insert(file.path);
                plan.ingest.push(planned());
            }
            Staleness::MetadataStale => plan.update_metadata.push(planned()),
            Staleness::Unchanged => plan.unchanged += 1,
        }
    }

    // 3. Content changes subsume metadata changes.
    plan.update_metadata.retain(|f| !ingesting.contains(f.path.as_path()));

    // 4. Indexed files that left the library.
    let mut removed: Vec<(&PathBuf, &ContentKey)> = paths
        .by_path
        .iter()
        .filter(|(path, _)| !on_disk.contains(path.as_path()))
        .collect();
    removed.sort();
    for (path, key) in removed {
        plan.schedule_deletion(key.clone(), DeletionReason::Removed, Some(path.clone()));
    }

    // 5. Files being reingested drop their old entry first.
    let replaced: Vec<(ContentKey, PathBuf)> = plan
        .ingest
        .iter()
        .filter_map(|f| paths.key_for(&f.path).map(|key| (key.clone(), f.path.clone())))
        .collect();
    for (key, path) in replaced {
        plan.schedule_deletion(key, DeletionReason::StaleContent, Some(path));
    }

    plan
}
