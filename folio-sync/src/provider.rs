//! Metadata providers.
//!
//! The library itself is the primary provider. Enrichment providers
//! contribute secondary records for a restricted field subset. Every
//! provider receives the data it needs at construction.

use crate::error::ProviderError;
use crate::library::LibrarySnapshot;
use async_trait::async_trait;
use chrono::NaiveDate;
use folio_model::{DocumentDetail, LibraryDocument, OtherValue};
use folio_types::DocumentId;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result type for provider lookups.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A metadata lookup.
///
/// Library lookups use `document_id` and `file_location`; enrichment
/// lookups use the bibliographic keys copied from the primary record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailQuery {
    pub document_id: Option<DocumentId>,
    pub file_location: Option<PathBuf>,
    pub title: Option<String>,
    pub doi: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    /// Fields the caller wants back. `None` asks for everything.
    pub fields: Option<Vec<String>>,
}

impl DetailQuery {
    /// Lookup of a library document's record for one of its files.
    pub fn for_document(id: DocumentId, file_location: &Path) -> Self {
        Self {
            document_id: Some(id),
            file_location: Some(file_location.to_path_buf()),
            ..Default::default()
        }
    }

    /// Enrichment lookup keyed by the primary record's title, DOI, authors
    /// and journal.
    pub fn enrichment(primary: &DocumentDetail, fields: &[String]) -> Self {
        Self {
            title: primary.title.clone(),
            doi: primary.doi.clone(),
            authors: primary.authors.clone().unwrap_or_default(),
            journal: primary.journal.clone(),
            fields: Some(fields.to_vec()),
            ..Default::default()
        }
    }
}

/// A source of document metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Looks up a record. `Ok(None)` means the provider knows nothing.
    async fn query(&self, query: &DetailQuery) -> ProviderResult<Option<DocumentDetail>>;
}

// ── Library ──────────────────────────────────────────────────────

/// Maps library `type` values to BibTeX entry types.
const BIBTEX_TYPES: &[(&str, &str)] = &[
    ("article", "article"),
    ("journal-article", "article"),
    ("book", "book"),
    ("monograph", "book"),
    ("edited-book", "book"),
    ("reference-book", "book"),
    ("book-chapter", "inbook"),
    ("book-section", "inbook"),
    ("inbook", "inbook"),
    ("incollection", "incollection"),
    ("proceedings", "proceedings"),
    ("proceedings-article", "inproceedings"),
    ("inproceedings", "inproceedings"),
    ("conference", "inproceedings"),
    ("report", "techreport"),
    ("techreport", "techreport"),
    ("dissertation", "phdthesis"),
    ("phdthesis", "phdthesis"),
    ("mastersthesis", "mastersthesis"),
    ("manual", "manual"),
    ("unpublished", "unpublished"),
    ("posted-content", "misc"),
];

/// BibTeX entry type for a library `type` value, `misc` when unknown.
pub fn bibtex_type(kind: Option<&str>) -> &'static str {
    let Some(kind) = kind.map(str::trim) else {
        return "misc";
    };
    BIBTEX_TYPES
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(kind))
        .map_or("misc", |(_, to)| *to)
}

/// The primary provider: builds records from the library's own fields.
#[derive(Debug, Clone, Default)]
pub struct LibraryProvider {
    documents: HashMap<DocumentId, LibraryDocument>,
}

impl LibraryProvider {
    pub const NAME: &'static str = "library";

    pub fn new(documents: impl IntoIterator<Item = LibraryDocument>) -> Self {
        Self {
            documents: documents.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    pub fn from_snapshot(library: &LibrarySnapshot) -> Self {
        Self::new(library.documents().iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Builds the record for `document`, keeping only `fields` of its raw
    /// data when given.
    pub fn detail_for(
        document: &LibraryDocument,
        file_location: Option<&Path>,
        fields: Option<&[String]>,
    ) -> DocumentDetail {
        let filtered;
        let document = match fields {
            Some(fields) => {
                let mut copy = LibraryDocument::new(document.id.clone());
                copy.data = document
                    .data
                    .iter()
                    .filter(|(k, _)| fields.iter().any(|f| f == *k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                filtered = copy;
                &filtered
            }
            None => document,
        };

        let year = document.get_number("year").map(|y| y as i32);
        let authors: Vec<String> = document
            .authors()
            .iter()
            .map(|a| a.display_name())
            .filter(|a| !a.is_empty())
            .collect();

        let mut detail = DocumentDetail {
            citation: Some(document.citation_token()),
            title: document.get_str("title").map(str::to_string),
            authors: (!authors.is_empty()).then_some(authors),
            year,
            publication_date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
            doi: text_field(document, "doi"),
            journal: text_field(document, "journal"),
            volume: text_field(document, "volume"),
            issue: text_field(document, "issue"),
            publisher: text_field(document, "publisher"),
            issn: text_field(document, "issn"),
            pages: text_field(document, "pages"),
            url: text_field(document, "url"),
            bibtex_type: Some(bibtex_type(document.get_str("type")).to_string()),
            file_location: file_location.map(Path::to_path_buf),
            ..Default::default()
        };

        for (key, value) in &document.data {
            if DocumentDetail::is_structured_field(key) || is_structured_source(key) {
                continue;
            }
            if let Some(value) = OtherValue::from_json(value) {
                detail.insert_other(key, value);
            }
        }
        detail.insert_other("client_source", "library");
        detail.insert_other("bibtex_source", "self_generated");
        detail.set_other("library_id", document.id.as_str());
        detail
    }
}

#[async_trait]
impl MetadataProvider for LibraryProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn query(&self, query: &DetailQuery) -> ProviderResult<Option<DocumentDetail>> {
        let Some(id) = &query.document_id else {
            return Err(ProviderError::new(Self::NAME, "query without document id"));
        };
        let Some(document) = self.documents.get(id) else {
            warn!("Document not found for library id {}", id);
            return Ok(None);
        };
        Ok(Some(Self::detail_for(
            document,
            query.file_location.as_deref(),
            query.fields.as_deref(),
        )))
    }
}

/// Raw keys folded into structured fields rather than copied to `other`.
fn is_structured_source(key: &str) -> bool {
    matches!(key, "author_list" | "editor_list")
}

fn text_field(document: &LibraryDocument, key: &str) -> Option<String> {
    match document.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Journal quality ──────────────────────────────────────────────

/// Scores documents by the quality rating of their journal.
#[derive(Debug, Clone, Default)]
pub struct JournalQualityProvider {
    ratings: HashMap<String, i32>,
}

impl JournalQualityProvider {
    pub const NAME: &'static str = "journal-quality";

    pub fn new<S: AsRef<str>>(ratings: impl IntoIterator<Item = (S, i32)>) -> Self {
        Self {
            ratings: ratings
                .into_iter()
                .map(|(journal, rating)| (normalize_journal(journal.as_ref()), rating))
                .collect(),
        }
    }

    pub fn rating(&self, journal: &str) -> Option<i32> {
        self.ratings.get(&normalize_journal(journal)).copied()
    }
}

#[async_trait]
impl MetadataProvider for JournalQualityProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn query(&self, query: &DetailQuery) -> ProviderResult<Option<DocumentDetail>> {
        let Some(journal) = query.journal.as_deref() else {
            return Ok(None);
        };
        let Some(rating) = self.rating(journal) else {
            debug!("No quality rating for journal '{}'", journal);
            return Ok(None);
        };
        Ok(Some(DocumentDetail {
            source_quality: Some(rating),
            ..Default::default()
        }))
    }
}

fn normalize_journal(journal: &str) -> String {
    journal
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .trim_start_matches("the ")
        .to_string()
}

/// Scriptable provider for tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, PoisonError};

    /// Returns a fixed record for every query and records what it was asked.
    #[derive(Debug, Default)]
    pub struct MockProvider {
        name: String,
        response: Mutex<Option<DocumentDetail>>,
        failing: AtomicBool,
        queries: Mutex<Vec<DetailQuery>>,
    }

    impl MockProvider {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                ..Default::default()
            }
        }

        #[must_use]
        pub fn with_response(self, detail: DocumentDetail) -> Self {
            self.set_response(Some(detail));
            self
        }

        pub fn set_response(&self, detail: Option<DocumentDetail>) {
            *self.response.lock().unwrap_or_else(PoisonError::into_inner) = detail;
        }

        /// Makes every subsequent query fail.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn queries(&self) -> Vec<DetailQuery> {
            self.queries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        pub fn query_count(&self) -> usize {
            self.queries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }
    }

    #[async_trait]
    impl MetadataProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn query(&self, query: &DetailQuery) -> ProviderResult<Option<DocumentDetail>> {
            self.queries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(query.clone());
            if self.failing.load(Ordering::SeqCst) {
                return Err(ProviderError::new(&self.name, "lookup failed"));
            }
            Ok(self
                .response
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone())
        }
    }
}
