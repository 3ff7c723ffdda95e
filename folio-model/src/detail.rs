use chrono::NaiveDate;
use folio_types::ContentKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Fields a lower-trust source may overwrite unless configured otherwise.
pub const DEFAULT_OVERWRITE_FIELDS: &[&str] = &["citation"];

/// A single auxiliary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Int(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            Value::String(s) => Some(Scalar::Text(s.clone())),
            other => Some(Scalar::Text(other.to_string())),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// Value stored under an auxiliary (`other`) key: one scalar, or the
/// ordered list of values several sources contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OtherValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl OtherValue {
    /// Converts a library JSON value. `null` has no representation.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(OtherValue::List(
                items.iter().filter_map(Scalar::from_json).collect(),
            )),
            other => Scalar::from_json(other).map(OtherValue::Scalar),
        }
    }

    /// All contained scalars in order.
    pub fn items(&self) -> Vec<&Scalar> {
        match self {
            OtherValue::Scalar(s) => vec![s],
            OtherValue::List(items) => items.iter().collect(),
        }
    }

    /// First text value, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.items().into_iter().find_map(Scalar::as_text)
    }

    fn into_items(self) -> Vec<Scalar> {
        match self {
            OtherValue::Scalar(s) => vec![s],
            OtherValue::List(items) => items,
        }
    }

    /// Appends the incoming values that are not already present.
    ///
    /// Leaves `self` untouched when nothing new arrives, so a value keeps
    /// its shape across repeated merges.
    pub fn accumulate(&mut self, incoming: OtherValue) {
        let mut fresh: Vec<Scalar> = Vec::new();
        {
            let existing = self.items();
            for value in incoming.into_items() {
                if !existing.contains(&&value) && !fresh.contains(&value) {
                    fresh.push(value);
                }
            }
        }
        if fresh.is_empty() {
            return;
        }
        let mut items = std::mem::replace(self, OtherValue::List(Vec::new())).into_items();
        items.extend(fresh);
        *self = OtherValue::List(items);
    }
}

impl From<Scalar> for OtherValue {
    fn from(value: Scalar) -> Self {
        OtherValue::Scalar(value)
    }
}

impl From<Vec<Scalar>> for OtherValue {
    fn from(values: Vec<Scalar>) -> Self {
        OtherValue::List(values)
    }
}

impl From<&str> for OtherValue {
    fn from(s: &str) -> Self {
        OtherValue::Scalar(s.into())
    }
}

impl From<String> for OtherValue {
    fn from(s: String) -> Self {
        OtherValue::Scalar(s.into())
    }
}

impl From<i64> for OtherValue {
    fn from(i: i64) -> Self {
        OtherValue::Scalar(i.into())
    }
}

impl From<bool> for OtherValue {
    fn from(b: bool) -> Self {
        OtherValue::Scalar(b.into())
    }
}

/// Merged, authoritative metadata for one indexed document.
///
/// Structured fields are sticky once set: later, lower-trust sources only
/// fill gaps, except for fields named in `overwrite_allow`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibtex_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_quality: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_retracted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_location: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<ContentKey>,
    /// Auxiliary fields with provenance-preserving accumulation.
    #[serde(default)]
    pub other: BTreeMap<String, OtherValue>,
    /// Field names (structured or auxiliary) a later source may overwrite.
    #[serde(default)]
    pub overwrite_allow: BTreeSet<String>,
}

impl DocumentDetail {
    /// Names of the structured fields, as used in allow-sets and field filters.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "key",
        "docname",
        "citation",
        "title",
        "authors",
        "year",
        "publication_date",
        "doi",
        "journal",
        "volume",
        "issue",
        "publisher",
        "issn",
        "pages",
        "url",
        "bibtex_type",
        "citation_count",
        "source_quality",
        "is_retracted",
        "file_location",
        "doc_id",
    ];

    /// Returns true if `name` is a structured field rather than an `other` key.
    pub fn is_structured_field(name: &str) -> bool {
        Self::FIELD_NAMES.contains(&name)
    }

    /// Accumulates an auxiliary value under `key`.
    pub fn insert_other(&mut self, key: &str, value: impl Into<OtherValue>) {
        let value = value.into();
        match self.other.get_mut(key) {
            Some(existing) => existing.accumulate(value),
            None => {
                self.other.insert(key.to_string(), value);
            }
        }
    }

    /// Replaces the auxiliary value under `key`.
    pub fn set_other(&mut self, key: &str, value: impl Into<OtherValue>) {
        self.other.insert(key.to_string(), value.into());
    }

    /// First text value stored under an auxiliary key.
    pub fn other_text(&self, key: &str) -> Option<&str> {
        self.other.get(key).and_then(OtherValue::first_text)
    }

    /// The bibliographic reference key: `ref`, falling back to the
    /// library identifier.
    pub fn reference_key(&self) -> Option<&str> {
        self.other_text("ref")
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or_else(|| self.other_text("library_id"))
    }

    /// External citation token, e.g. `@smith2020`.
    pub fn citation_token(&self) -> Option<String> {
        self.reference_key().map(|r| format!("@{r}"))
    }

    /// File name of the source file, for display.
    pub fn display_filename(&self) -> Option<String> {
        self.file_location
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}
