//! Per-file staleness classification.

use folio_model::{IndexEntry, LibraryDocument};
use folio_types::Timestamp;
use serde::Serialize;
use std::fmt;

/// How a library file relates to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Staleness {
    /// No index entry records this path.
    Unseen,
    /// The file changed after it was last ingested.
    ContentStale,
    /// Only the document's metadata changed since the last refresh.
    MetadataStale,
    Unchanged,
}

impl Staleness {
    /// Returns true if the file's content must be (re)ingested.
    pub fn needs_ingest(self) -> bool {
        matches!(self, Staleness::Unseen | Staleness::ContentStale)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Staleness::Unseen => "unseen",
            Staleness::ContentStale => "content-stale",
            Staleness::MetadataStale => "metadata-stale",
            Staleness::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Classifies one file.
///
/// `modified` is the file's modification time and `indexed` the entry that
/// currently records the file's path, if any. Force mode treats every file
/// as unseen. A file whose entry names another owning document is
/// metadata-stale; otherwise a document without a metadata timestamp never
/// is.
pub fn classify(
    modified: Timestamp,
    document: &LibraryDocument,
    indexed: Option<&IndexEntry>,
    force: bool,
) -> Staleness {
    let Some(entry) = indexed else {
        return Staleness::Unseen;
    };
    if force {
        return Staleness::Unseen;
    }
    if modified.is_newer_than(&entry.file_last_indexed) {
        return Staleness::ContentStale;
    }
    if entry.document_id.as_ref().is_some_and(|owner| *owner != document.id) {
        return Staleness::MetadataStale;
    }
    let metadata_modified = document.metadata_modified.unwrap_or(Timestamp::ZERO);
    if metadata_modified.is_newer_than(&entry.metadata_last_updated) {
        return Staleness::MetadataStale;
    }
    Staleness::Unchanged
}
