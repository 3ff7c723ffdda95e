//! The in-memory form of the derived index.

use folio_model::IndexEntry;
use folio_types::ContentKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Version of the on-disk snapshot layout. Bump on any incompatible change
/// to `IndexSnapshot`, `IndexEntry` or `DocumentDetail`.
pub const SCHEMA_VERSION: u32 = 1;

/// The derived index for one library.
///
/// Entries are keyed by content, so at most one entry exists per
/// [`ContentKey`]. The map is ordered, which keeps serialization
/// byte-stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    schema_version: u32,
    library: String,
    #[serde(default)]
    entries: BTreeMap<ContentKey, IndexEntry>,
}

impl IndexSnapshot {
    /// Creates an empty snapshot for a library.
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            library: library.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ContentKey) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &ContentKey) -> Option<&mut IndexEntry> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts an entry under its own content key, returning any entry it
    /// replaced.
    pub fn insert(&mut self, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(entry.content_key.clone(), entry)
    }

    pub fn remove(&mut self, key: &ContentKey) -> Option<IndexEntry> {
        self.entries.remove(key)
    }

    /// Iterates entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ContentKey> {
        self.entries.keys()
    }

    /// Finds the entry built from `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.values().find(|e| e.path() == Some(path))
    }

    /// Builds the file path → content key mapping used for planning.
    ///
    /// Entries without a path are reported as malformed. When several
    /// entries claim the same path, the most recently ingested one owns it
    /// and the others are reported as malformed too.
    pub fn path_index(&self) -> PathIndex {
        let mut by_path: HashMap<PathBuf, ContentKey> = HashMap::new();
        let mut malformed = Vec::new();

        for entry in self.entries.values() {
            let Some(path) = entry.file_path.clone() else {
                malformed.push(entry.content_key.clone());
                continue;
            };
            match by_path.get(&path) {
                Some(owner) => {
                    let owner_time = self.entries[owner].file_last_indexed;
                    if entry.file_last_indexed > owner_time {
                        malformed.push(owner.clone());
                        by_path.insert(path, entry.content_key.clone());
                    } else {
                        malformed.push(entry.content_key.clone());
                    }
                }
                None => {
                    by_path.insert(path, entry.content_key.clone());
                }
            }
        }

        malformed.sort();
        PathIndex { by_path, malformed }
    }
}

/// Path lookup over an [`IndexSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    /// Indexed file path → content key.
    pub by_path: HashMap<PathBuf, ContentKey>,
    /// Entries that cannot be attributed to a single path.
    pub malformed: Vec<ContentKey>,
}

impl PathIndex {
    pub fn key_for(&self, path: &Path) -> Option<&ContentKey> {
        self.by_path.get(path)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }
}
