use folio_model::{split_author_names, title_case, LibraryDocument, PersonName};
use folio_types::{DocumentId, Timestamp};
use serde_json::json;

fn doc(id: &str) -> LibraryDocument {
    LibraryDocument::new(DocumentId::new(id).unwrap())
}

// ── Field access ─────────────────────────────────────────────────

#[test]
fn get_str_trims_and_skips_blank() {
    let d = doc("a").with_field("title", "  Deep Nets  ").with_field("doi", "   ");
    assert_eq!(d.get_str("title"), Some("Deep Nets"));
    assert_eq!(d.get_str("doi"), None);
    assert_eq!(d.get_str("missing"), None);
}

#[test]
fn get_number_accepts_numeric_strings() {
    let d = doc("a").with_field("year", "2021").with_field("volume", 12);
    assert_eq!(d.get_number("year"), Some(2021.0));
    assert_eq!(d.get_number("volume"), Some(12.0));
    assert_eq!(d.get_number("title"), None);
}

#[test]
fn get_bool_reads_booleans_only() {
    let d = doc("a").with_field("read", true).with_field("flag", "yes");
    assert_eq!(d.get_bool("read"), Some(true));
    assert_eq!(d.get_bool("flag"), None);
}

#[test]
fn builder_collects_files_and_timestamp() {
    let d = doc("a")
        .with_file("/lib/a/paper.pdf")
        .with_file("/lib/a/notes.txt")
        .with_metadata_modified(Timestamp::from_millis(9));
    assert_eq!(d.files.len(), 2);
    assert_eq!(d.metadata_modified, Some(Timestamp::from_millis(9)));
}

// ── Citation token ───────────────────────────────────────────────

#[test]
fn citation_token_prefers_ref() {
    let d = doc("xk2j").with_field("ref", "smith2020");
    assert_eq!(d.reference_key(), Some("smith2020"));
    assert_eq!(d.citation_token(), "@smith2020");
}

#[test]
fn citation_token_falls_back_to_id_on_blank_ref() {
    let d = doc("xk2j").with_field("ref", "  ");
    assert_eq!(d.reference_key(), None);
    assert_eq!(d.citation_token(), "@xk2j");
}

// ── Authors and editors ──────────────────────────────────────────

#[test]
fn authors_prefer_structured_list() {
    let d = doc("a")
        .with_field(
            "author_list",
            json!([{"given": "jane", "family": "doe"}, {"given": "John", "family": "Smith"}]),
        )
        .with_field("author", "Ignored, Person");
    let authors = d.authors();
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0], PersonName::new("jane", "doe"));
}

#[test]
fn authors_derived_from_raw_string() {
    let d = doc("a").with_field("author", "Doe, Jane and John Smith");
    assert_eq!(
        d.authors(),
        vec![PersonName::new("Jane", "Doe"), PersonName::new("John", "Smith")]
    );
}

#[test]
fn empty_structured_list_falls_back_to_raw() {
    let d = doc("a")
        .with_field("editor_list", json!([]))
        .with_field("editor", "Knuth, Donald");
    assert_eq!(d.editors(), vec![PersonName::new("Donald", "Knuth")]);
}

#[test]
fn no_authors_is_empty() {
    assert!(doc("a").authors().is_empty());
}

#[test]
fn split_single_word_name() {
    assert_eq!(split_author_names("Plato"), vec![PersonName::new("", "Plato")]);
}

#[test]
fn split_skips_empty_segments() {
    assert_eq!(split_author_names(" and Doe, J. and ").len(), 1);
}

#[test]
fn display_name_title_cases() {
    assert_eq!(PersonName::new("jane", "o'brien").display_name(), "Jane O'Brien");
    assert_eq!(PersonName::new("", "PLATO").display_name(), "Plato");
}

#[test]
fn title_case_handles_hyphens() {
    assert_eq!(title_case("jean-luc picard"), "Jean-Luc Picard");
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn deserializes_with_defaults() {
    let d: LibraryDocument = serde_json::from_value(json!({"id": "abc"})).unwrap();
    assert!(d.files.is_empty());
    assert!(d.data.is_empty());
    assert_eq!(d.metadata_modified, None);
}
