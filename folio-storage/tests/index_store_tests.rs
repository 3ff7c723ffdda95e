use folio_model::{DocumentDetail, IndexEntry};
use folio_storage::{IndexSnapshot, IndexStore, StorageError, SCHEMA_VERSION};
use folio_types::{ContentKey, DocumentId, Timestamp};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn entry(content: &[u8], path: Option<&str>, indexed_at: u64) -> IndexEntry {
    IndexEntry {
        content_key: ContentKey::from_bytes(content),
        file_path: path.map(PathBuf::from),
        document_id: Some(DocumentId::new("doc").unwrap()),
        docname: "doc".into(),
        citation: "@doc".into(),
        detail: DocumentDetail {
            title: Some("A Title".into()),
            ..Default::default()
        },
        file_last_indexed: Timestamp::from_millis(indexed_at),
        metadata_last_updated: Timestamp::from_millis(indexed_at),
    }
}

// ── Snapshot ─────────────────────────────────────────────────────

#[test]
fn new_snapshot_is_empty_and_versioned() {
    let snap = IndexSnapshot::new("main");
    assert!(snap.is_empty());
    assert_eq!(snap.len(), 0);
    assert_eq!(snap.library(), "main");
    assert_eq!(snap.schema_version(), SCHEMA_VERSION);
}

#[test]
fn insert_replaces_same_content_key() {
    let mut snap = IndexSnapshot::new("main");
    assert!(snap.insert(entry(b"a", Some("/lib/a.pdf"), 1)).is_none());
    let replaced = snap.insert(entry(b"a", Some("/lib/a-moved.pdf"), 2));
    assert!(replaced.is_some());
    assert_eq!(snap.len(), 1);
}

#[test]
fn remove_and_lookup() {
    let mut snap = IndexSnapshot::new("main");
    let e = entry(b"a", Some("/lib/a.pdf"), 1);
    let key = e.content_key.clone();
    snap.insert(e);

    assert!(snap.contains(&key));
    assert!(snap.find_by_path(&PathBuf::from("/lib/a.pdf")).is_some());
    assert!(snap.remove(&key).is_some());
    assert!(snap.remove(&key).is_none());
    assert!(snap.find_by_path(&PathBuf::from("/lib/a.pdf")).is_none());
}

#[test]
fn path_index_reports_pathless_entries_as_malformed() {
    let mut snap = IndexSnapshot::new("main");
    snap.insert(entry(b"good", Some("/lib/good.pdf"), 1));
    let bad = entry(b"bad", None, 1);
    let bad_key = bad.content_key.clone();
    snap.insert(bad);

    let index = snap.path_index();
    assert_eq!(index.by_path.len(), 1);
    assert!(index.contains_path(&PathBuf::from("/lib/good.pdf")));
    assert_eq!(index.malformed, vec![bad_key]);
}

#[test]
fn path_index_keeps_newest_entry_for_shared_path() {
    let mut snap = IndexSnapshot::new("main");
    let old = entry(b"old", Some("/lib/a.pdf"), 1);
    let new = entry(b"new", Some("/lib/a.pdf"), 5);
    let (old_key, new_key) = (old.content_key.clone(), new.content_key.clone());
    snap.insert(old);
    snap.insert(new);

    let index = snap.path_index();
    assert_eq!(index.key_for(&PathBuf::from("/lib/a.pdf")), Some(&new_key));
    assert_eq!(index.malformed, vec![old_key]);
}

// ── Store: load ──────────────────────────────────────────────────

#[test]
fn load_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    assert!(store.load().unwrap().is_none());
    assert!(store.load_or_empty().unwrap().is_empty());
}

#[test]
fn save_then_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    let mut snap = store.empty_snapshot();
    snap.insert(entry(b"a", Some("/lib/a.pdf"), 10));
    snap.insert(entry(b"b", Some("/lib/b.pdf"), 20));

    store.save(&snap).unwrap();
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, snap);
}

#[test]
fn save_is_byte_stable() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    let mut snap = store.empty_snapshot();
    snap.insert(entry(b"b", Some("/lib/b.pdf"), 20));
    snap.insert(entry(b"a", Some("/lib/a.pdf"), 10));

    store.save(&snap).unwrap();
    let first = std::fs::read(store.path()).unwrap();
    let reloaded = store.load().unwrap().unwrap();
    store.save(&reloaded).unwrap();
    let second = std::fs::read(store.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn save_leaves_no_temporary_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    store.save(&store.empty_snapshot()).unwrap();
    store.save(&store.empty_snapshot()).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["main.index.json".to_string()]);
}

#[test]
fn save_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path().join("a").join("b"), "main");
    store.save(&store.empty_snapshot()).unwrap();
    assert!(store.path().exists());
}

#[test]
fn library_name_is_sanitized_into_file_name() {
    let store = IndexStore::in_dir("/cache", "my lib/papers");
    assert_eq!(store.path(), PathBuf::from("/cache/my_lib_papers.index.json"));
    assert_eq!(store.library(), "my lib/papers");
}

// ── Store: failures ──────────────────────────────────────────────

#[test]
fn corrupt_file_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    std::fs::write(store.path(), b"{not json").unwrap();

    match store.load() {
        Err(StorageError::Corrupt { .. }) => {}
        other => panic!("expected Corrupt, got {other:?}"),
    }
}

#[test]
fn structurally_wrong_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    let text = format!(r#"{{"schema_version":{SCHEMA_VERSION},"library":"main","entries":[1,2]}}"#);
    std::fs::write(store.path(), text).unwrap();

    assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
}

#[test]
fn invalid_content_key_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    let mut snap = IndexSnapshot::new("main");
    let e = entry(b"a", Some("/lib/a.pdf"), 1);
    let key = e.content_key.to_string();
    snap.insert(e);
    store.save(&snap).unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    std::fs::write(store.path(), text.replace(&key, "a\u{00e9}\u{00e9}\u{00e9}\u{00e9}")).unwrap();

    assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
}

#[test]
fn schema_mismatch_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    std::fs::write(
        store.path(),
        r#"{"schema_version":999,"library":"main","entries":{}}"#,
    )
    .unwrap();

    match store.load() {
        Err(StorageError::SchemaMismatch { found, expected }) => {
            assert_eq!(found, 999);
            assert_eq!(expected, SCHEMA_VERSION);
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
}

#[test]
fn unversioned_blob_is_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::in_dir(dir.path(), "main");
    std::fs::write(store.path(), r#"{"docs":{}}"#).unwrap();
    assert!(matches!(
        store.load(),
        Err(StorageError::SchemaMismatch { found: 0, .. })
    ));
}

#[test]
fn snapshot_of_other_library_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.index.json");
    IndexStore::at_path(&path, "one")
        .save(&IndexSnapshot::new("one"))
        .unwrap();

    let other = IndexStore::at_path(&path, "two");
    assert!(matches!(other.load(), Err(StorageError::InvalidData(_))));
    assert!(matches!(
        other.save(&IndexSnapshot::new("one")),
        Err(StorageError::InvalidData(_))
    ));
}

#[test]
fn unwritable_location_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let store = IndexStore::in_dir(blocker.join("nested"), "main");

    assert!(matches!(
        store.save(&store.empty_snapshot()),
        Err(StorageError::Io { .. })
    ));
}

#[test]
fn error_display_mentions_versions() {
    let err = StorageError::SchemaMismatch { found: 2, expected: 1 };
    let text = err.to_string();
    assert!(text.contains('2'));
    assert!(text.contains('1'));
}
