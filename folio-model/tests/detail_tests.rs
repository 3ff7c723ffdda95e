use folio_model::{DocumentDetail, OtherValue, Scalar};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

// ── OtherValue accumulation ──────────────────────────────────────

#[test]
fn accumulate_two_scalars_builds_ordered_list() {
    let mut v = OtherValue::from("library");
    v.accumulate(OtherValue::from("remote"));
    assert_eq!(v, OtherValue::List(vec!["library".into(), "remote".into()]));
}

#[test]
fn accumulate_skips_values_already_present() {
    let mut v = OtherValue::List(vec!["library".into()]);
    v.accumulate(OtherValue::from("library"));
    assert_eq!(v, OtherValue::List(vec!["library".into()]));
}

#[test]
fn accumulate_keeps_scalar_shape_when_nothing_new() {
    let mut v = OtherValue::from(3i64);
    v.accumulate(OtherValue::from(3i64));
    assert_eq!(v, OtherValue::Scalar(Scalar::Int(3)));
}

#[test]
fn accumulate_list_into_list() {
    let mut v = OtherValue::List(vec!["a".into()]);
    v.accumulate(OtherValue::List(vec!["b".into(), "a".into(), "c".into()]));
    assert_eq!(v, OtherValue::List(vec!["a".into(), "b".into(), "c".into()]));
}

#[test]
fn from_json_conversions() {
    assert_eq!(OtherValue::from_json(&json!(null)), None);
    assert_eq!(OtherValue::from_json(&json!(true)), Some(OtherValue::from(true)));
    assert_eq!(OtherValue::from_json(&json!(7)), Some(OtherValue::from(7i64)));
    assert_eq!(
        OtherValue::from_json(&json!(1.5)),
        Some(OtherValue::Scalar(Scalar::Float(1.5)))
    );
    assert_eq!(
        OtherValue::from_json(&json!(["x", 2])),
        Some(OtherValue::List(vec!["x".into(), Scalar::Int(2)]))
    );
    assert_eq!(
        OtherValue::from_json(&json!({"k": 1})),
        Some(OtherValue::from(r#"{"k":1}"#))
    );
}

#[test]
fn other_value_serde_is_untagged() {
    let v = OtherValue::List(vec!["a".into(), Scalar::Int(1), Scalar::Bool(false)]);
    let text = serde_json::to_string(&v).unwrap();
    assert_eq!(text, r#"["a",1,false]"#);
    let back: OtherValue = serde_json::from_str(&text).unwrap();
    assert_eq!(back, v);
}

// ── DocumentDetail ───────────────────────────────────────────────

#[test]
fn insert_other_accumulates_and_set_other_replaces() {
    let mut d = DocumentDetail::default();
    d.insert_other("client_source", "library");
    d.insert_other("client_source", "semantic_scholar");
    assert_eq!(
        d.other["client_source"],
        OtherValue::List(vec!["library".into(), "semantic_scholar".into()])
    );

    d.set_other("client_source", "only");
    assert_eq!(d.other["client_source"], OtherValue::from("only"));
}

#[test]
fn reference_key_prefers_ref_then_library_id() {
    let mut d = DocumentDetail::default();
    assert_eq!(d.reference_key(), None);
    assert_eq!(d.citation_token(), None);

    d.set_other("library_id", "xk2j");
    assert_eq!(d.citation_token().as_deref(), Some("@xk2j"));

    d.set_other("ref", "smith2020");
    assert_eq!(d.citation_token().as_deref(), Some("@smith2020"));
}

#[test]
fn blank_ref_is_ignored() {
    let mut d = DocumentDetail::default();
    d.set_other("ref", "  ");
    d.set_other("library_id", "xk2j");
    assert_eq!(d.reference_key(), Some("xk2j"));
}

#[test]
fn structured_field_names() {
    assert!(DocumentDetail::is_structured_field("title"));
    assert!(DocumentDetail::is_structured_field("citation_count"));
    assert!(!DocumentDetail::is_structured_field("ref"));
    assert!(!DocumentDetail::is_structured_field("tags"));
}

#[test]
fn display_filename_from_location() {
    let d = DocumentDetail {
        file_location: Some(PathBuf::from("/lib/doc/paper.pdf")),
        ..Default::default()
    };
    assert_eq!(d.display_filename().as_deref(), Some("paper.pdf"));
}

#[test]
fn unset_fields_are_not_serialized() {
    let d = DocumentDetail {
        title: Some("T".into()),
        ..Default::default()
    };
    let value = serde_json::to_value(&d).unwrap();
    assert_eq!(value, json!({"title": "T", "other": {}, "overwrite_allow": []}));
}

#[test]
fn serde_roundtrip_preserves_record() {
    let mut d = DocumentDetail {
        title: Some("Attention".into()),
        authors: Some(vec!["Ada Lovelace".into()]),
        year: Some(2017),
        publication_date: chrono::NaiveDate::from_ymd_opt(2017, 1, 1),
        is_retracted: Some(false),
        ..Default::default()
    };
    d.insert_other("tags", "ml");
    d.overwrite_allow.insert("citation".into());

    let text = serde_json::to_string(&d).unwrap();
    let back: DocumentDetail = serde_json::from_str(&text).unwrap();
    assert_eq!(back, d);
}
