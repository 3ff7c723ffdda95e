use crate::DocumentDetail;
use folio_types::{ContentKey, DocumentId, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One record of the derived index.
///
/// `file_path` is optional on the wire so that entries written without a
/// source path can still be loaded and then cleaned up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub content_key: ContentKey,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub document_id: Option<DocumentId>,
    /// Name the retrieval engine assigned on ingestion.
    pub docname: String,
    /// Citation token shown to users.
    pub citation: String,
    pub detail: DocumentDetail,
    /// When the content was last ingested.
    pub file_last_indexed: Timestamp,
    /// When the metadata was last refreshed.
    pub metadata_last_updated: Timestamp,
}

impl IndexEntry {
    /// Returns true if the entry lacks fields the reconciler depends on.
    pub fn is_malformed(&self) -> bool {
        self.file_path.is_none()
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// File name of the source file, for display.
    pub fn display_filename(&self) -> Option<String> {
        self.file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}
