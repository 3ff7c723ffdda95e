//! Answers as they leave the retrieval engine.

use crate::DocumentDetail;
use folio_types::ContentKey;
use serde::{Deserialize, Serialize};

/// A generated answer before citation rewriting.
///
/// `answer` may contain inline handles such as `(smith2020 pages 3-5)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnswer {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub contexts: Vec<AnswerContext>,
}

/// One supporting context of an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerContext {
    /// Chunk name, conventionally `"<handle> pages <range>"`.
    pub name: String,
    #[serde(default)]
    pub pages: Option<String>,
    /// Relevance summary.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub score: f64,
    /// Source excerpt.
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content_key: Option<ContentKey>,
    #[serde(default)]
    pub detail: Option<DocumentDetail>,
}

impl AnswerContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: None,
            summary: String::new(),
            score: 0.0,
            excerpt: String::new(),
            content_key: None,
            detail: None,
        }
    }

    /// The internal handle: the first word of the chunk name.
    pub fn handle(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// The page range: explicit, or parsed from `"<handle> pages <range>"`.
    pub fn page_range(&self) -> Option<String> {
        if let Some(pages) = self.pages.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            return Some(pages.to_string());
        }
        let mut words = self.name.split_whitespace().skip(1);
        match (words.next(), words.next()) {
            (Some("pages"), Some(range)) => Some(range.to_string()),
            _ => None,
        }
    }
}
