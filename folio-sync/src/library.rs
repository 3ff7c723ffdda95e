//! A point-in-time view of the document library.

use crate::error::{SyncError, SyncResult};
use folio_model::LibraryDocument;
use folio_types::{DocumentId, Timestamp};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The library as one sync pass sees it: its documents and the
/// modification time of every attached file present on disk.
///
/// A file attached to a document but without a recorded modification time
/// is treated as absent.
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    name: String,
    documents: Vec<LibraryDocument>,
    by_id: HashMap<DocumentId, usize>,
    file_times: HashMap<PathBuf, Timestamp>,
}

/// One attached file of a [`LibrarySnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct LibraryFile<'a> {
    pub path: &'a Path,
    pub modified: Timestamp,
    pub document: &'a LibraryDocument,
}

impl LibrarySnapshot {
    /// Creates an empty snapshot. Use the builder methods to populate it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Reads file modification times from disk for every attached file.
    ///
    /// Files that cannot be found are left out, so they count as removed.
    pub async fn capture(
        name: impl Into<String>,
        documents: impl IntoIterator<Item = LibraryDocument>,
    ) -> SyncResult<Self> {
        let mut snapshot = Self::new(name);
        for document in documents {
            for path in &document.files {
                match tokio::fs::metadata(path).await {
                    Ok(meta) => {
                        let modified = meta.modified().map_err(|source| SyncError::Io {
                            path: path.clone(),
                            source,
                        })?;
                        snapshot
                            .file_times
                            .insert(path.clone(), Timestamp::from_system_time(modified));
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        warn!("File {} of document {} not found", path.display(), document.id);
                    }
                    Err(source) => {
                        return Err(SyncError::Io {
                            path: path.clone(),
                            source,
                        });
                    }
                }
            }
            snapshot.add_document(document);
        }
        debug!(
            "Captured library '{}': {} documents, {} files",
            snapshot.name,
            snapshot.documents.len(),
            snapshot.file_times.len()
        );
        Ok(snapshot)
    }

    /// Adds a document. A document with the same id replaces the earlier one.
    pub fn add_document(&mut self, document: LibraryDocument) {
        match self.by_id.get(&document.id) {
            Some(&i) => self.documents[i] = document,
            None => {
                self.by_id.insert(document.id.clone(), self.documents.len());
                self.documents.push(document);
            }
        }
    }

    #[must_use]
    pub fn with_document(mut self, document: LibraryDocument) -> Self {
        self.add_document(document);
        self
    }

    /// Records that `path` exists with the given modification time.
    pub fn set_file_time(&mut self, path: impl Into<PathBuf>, modified: Timestamp) {
        self.file_times.insert(path.into(), modified);
    }

    #[must_use]
    pub fn with_file_time(mut self, path: impl Into<PathBuf>, modified: Timestamp) -> Self {
        self.set_file_time(path, modified);
        self
    }

    /// Forgets a file, as if it had been deleted from disk.
    pub fn remove_file(&mut self, path: &Path) {
        self.file_times.remove(path);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documents(&self) -> &[LibraryDocument] {
        &self.documents
    }

    pub fn document(&self, id: &DocumentId) -> Option<&LibraryDocument> {
        self.by_id.get(id).map(|&i| &self.documents[i])
    }

    pub fn file_time(&self, path: &Path) -> Option<Timestamp> {
        self.file_times.get(path).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterates present files in document order.
    pub fn files(&self) -> impl Iterator<Item = LibraryFile<'_>> {
        self.documents.iter().flat_map(move |document| {
            document.files.iter().filter_map(move |path| {
                self.file_time(path).map(|modified| LibraryFile {
                    path: path.as_path(),
                    modified,
                    document,
                })
            })
        })
    }
}
