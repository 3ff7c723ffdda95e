use folio_model::LibraryDocument;
use folio_sync::LibrarySnapshot;
use folio_types::{DocumentId, Timestamp};
use std::path::Path;

fn doc(id: &str) -> LibraryDocument {
    LibraryDocument::new(DocumentId::new(id).unwrap())
}

#[tokio::test]
async fn capture_reads_modification_times() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("a.pdf");
    std::fs::write(&present, "content").unwrap();
    let absent = dir.path().join("gone.pdf");

    let library = LibrarySnapshot::capture(
        "lib",
        [doc("a").with_file(&present).with_file(&absent), doc("b")],
    )
    .await
    .unwrap();

    assert_eq!(library.name(), "lib");
    assert_eq!(library.documents().len(), 2);
    let modified = library.file_time(&present).unwrap();
    assert!(modified > Timestamp::ZERO);
    assert_eq!(library.file_time(&absent), None);

    let files: Vec<_> = library.files().map(|f| f.path.to_path_buf()).collect();
    assert_eq!(files, vec![present]);
}

#[test]
fn files_follow_document_order() {
    let library = LibrarySnapshot::new("lib")
        .with_document(doc("b").with_file("/lib/b.pdf"))
        .with_document(doc("a").with_file("/lib/a1.pdf").with_file("/lib/a2.pdf"))
        .with_file_time("/lib/a1.pdf", Timestamp::from_millis(1))
        .with_file_time("/lib/a2.pdf", Timestamp::from_millis(2))
        .with_file_time("/lib/b.pdf", Timestamp::from_millis(3));

    let files: Vec<(&Path, &str, u64)> = library
        .files()
        .map(|f| (f.path, f.document.id.as_str(), f.modified.as_millis()))
        .collect();

    assert_eq!(
        files,
        vec![
            (Path::new("/lib/b.pdf"), "b", 3),
            (Path::new("/lib/a1.pdf"), "a", 1),
            (Path::new("/lib/a2.pdf"), "a", 2),
        ]
    );
}

#[test]
fn re_adding_a_document_replaces_it() {
    let mut library = LibrarySnapshot::new("lib").with_document(doc("a").with_field("title", "Old"));
    library.add_document(doc("a").with_field("title", "New"));

    assert_eq!(library.documents().len(), 1);
    let id = DocumentId::new("a").unwrap();
    assert_eq!(library.document(&id).unwrap().get_str("title"), Some("New"));
}

#[test]
fn removed_file_is_no_longer_listed() {
    let mut library = LibrarySnapshot::new("lib")
        .with_document(doc("a").with_file("/lib/a.pdf"))
        .with_file_time("/lib/a.pdf", Timestamp::from_millis(1));
    assert_eq!(library.files().count(), 1);

    library.remove_file(Path::new("/lib/a.pdf"));
    assert_eq!(library.files().count(), 0);
    assert!(!library.is_empty());
}
