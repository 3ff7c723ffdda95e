//! Durable index snapshots.
//!
//! One JSON file per library under a process-wide cache directory. Saves go
//! through a temporary sibling that is renamed over the target, so `load`
//! never observes a partially written snapshot.

use crate::error::{StorageError, StorageResult};
use crate::snapshot::{IndexSnapshot, SCHEMA_VERSION};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name suffix of persisted snapshots: `<library>.index.json`.
pub const INDEX_FILE_SUFFIX: &str = "index.json";

/// Default location for snapshots: `<user cache dir>/folio`.
pub fn default_cache_dir() -> StorageResult<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join("folio"))
        .ok_or(StorageError::NoCacheDir)
}

#[derive(Deserialize)]
struct SnapshotHeader {
    #[serde(default)]
    schema_version: Option<u32>,
}

/// Loads and saves the [`IndexSnapshot`] of one library.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
    library: String,
}

impl IndexStore {
    /// Store for `library` in the default cache directory.
    pub fn for_library(library: &str) -> StorageResult<Self> {
        Ok(Self::in_dir(default_cache_dir()?, library))
    }

    /// Store for `library` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, library: &str) -> Self {
        let file = format!("{}.{}", file_stem(library), INDEX_FILE_SUFFIX);
        Self {
            path: dir.as_ref().join(file),
            library: library.to_string(),
        }
    }

    /// Store at an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>, library: &str) -> Self {
        Self {
            path: path.into(),
            library: library.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    /// A fresh snapshot for this store's library.
    pub fn empty_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot::new(self.library.clone())
    }

    /// Loads the snapshot. A missing file is `Ok(None)`.
    pub fn load(&self) -> StorageResult<Option<IndexSnapshot>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No index snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let header: SnapshotHeader =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        let found = header.schema_version.unwrap_or(0);
        if found != SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            });
        }

        let snapshot: IndexSnapshot =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if snapshot.library() != self.library {
            return Err(StorageError::InvalidData(format!(
                "snapshot at {} belongs to library '{}', expected '{}'",
                self.path.display(),
                snapshot.library(),
                self.library
            )));
        }

        debug!(
            "Loaded index snapshot with {} entries from {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(Some(snapshot))
    }

    /// Loads the snapshot, or an empty one if none was saved yet.
    pub fn load_or_empty(&self) -> StorageResult<IndexSnapshot> {
        Ok(self.load()?.unwrap_or_else(|| self.empty_snapshot()))
    }

    /// Replaces the persisted snapshot.
    pub fn save(&self, snapshot: &IndexSnapshot) -> StorageResult<()> {
        if snapshot.library() != self.library {
            return Err(StorageError::InvalidData(format!(
                "refusing to save snapshot of library '{}' into store for '{}'",
                snapshot.library(),
                self.library
            )));
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let bytes = serde_json::to_vec(snapshot)?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| StorageError::io(&dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::io(&self.path, e.error))?;

        info!(
            "Saved index snapshot ({} entries) to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn file_stem(library: &str) -> String {
    let stem: String = library
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "library".to_string() } else { stem }
}
