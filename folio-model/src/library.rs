use folio_types::{DocumentId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A document as the external library presents it.
///
/// The `data` object holds the library's bibliographic fields verbatim
/// (`title`, `author`, `author_list`, `year`, `doi`, `journal`, `ref`, ...).
/// Folio never writes back into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub data: Map<String, Value>,
    /// When the library last modified this document's metadata record.
    #[serde(default)]
    pub metadata_modified: Option<Timestamp>,
}

impl LibraryDocument {
    /// Creates a document with no files and no fields.
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            files: Vec::new(),
            data: Map::new(),
            metadata_modified: None,
        }
    }

    /// Attaches a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Sets a bibliographic field.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Sets the metadata-record modification time.
    #[must_use]
    pub fn with_metadata_modified(mut self, at: Timestamp) -> Self {
        self.metadata_modified = Some(at);
        self
    }

    /// Returns a raw field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns a string field, ignoring blank values.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns a numeric field. Numeric strings (e.g. `"2021"`) are accepted.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        match self.data.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns a boolean field.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(|v| v.as_bool())
    }

    /// The user-assigned citation key, if any.
    pub fn reference_key(&self) -> Option<&str> {
        self.get_str("ref")
    }

    /// Citation token handed to the retrieval engine: `@ref`, falling back
    /// to `@<id>`.
    pub fn citation_token(&self) -> String {
        match self.reference_key() {
            Some(r) => format!("@{r}"),
            None => format!("@{}", self.id),
        }
    }

    /// Structured author list.
    ///
    /// Prefers `author_list`; derives one from the raw `author` string when
    /// the library has not stored a structured list.
    pub fn authors(&self) -> Vec<PersonName> {
        self.person_list("author_list", "author")
    }

    /// Structured editor list, derived the same way as [`Self::authors`].
    pub fn editors(&self) -> Vec<PersonName> {
        self.person_list("editor_list", "editor")
    }

    fn person_list(&self, list_key: &str, raw_key: &str) -> Vec<PersonName> {
        if let Some(Value::Array(items)) = self.data.get(list_key) {
            let names: Vec<PersonName> = items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect();
            if !names.is_empty() {
                return names;
            }
        }
        self.get_str(raw_key)
            .map(split_author_names)
            .unwrap_or_default()
    }
}

/// One person's name, split into parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default)]
    pub given: String,
    #[serde(default)]
    pub family: String,
}

impl PersonName {
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            family: family.into(),
        }
    }

    /// `Given Family`, title-cased.
    pub fn display_name(&self) -> String {
        format!("{} {}", title_case(&self.given), title_case(&self.family))
            .trim()
            .to_string()
    }
}

/// Splits a raw name string such as `"Doe, Jane and John Smith"` into
/// structured names.
///
/// Accepts both `Family, Given` and `Given Family` forms; in the latter the
/// last word is taken as the family name.
pub fn split_author_names(raw: &str) -> Vec<PersonName> {
    raw.split(" and ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            if let Some((family, given)) = name.split_once(',') {
                return PersonName::new(given.trim(), family.trim());
            }
            match name.rsplit_once(char::is_whitespace) {
                Some((given, family)) => PersonName::new(given.trim(), family.trim()),
                None => PersonName::new("", name),
            }
        })
        .collect()
}

/// Uppercases the first letter of every word and lowercases the rest.
/// Any non-alphabetic character starts a new word.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
