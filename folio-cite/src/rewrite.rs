use crate::error::CiteResult;
use folio_model::{AnswerContext, DocumentDetail, RawAnswer};
use folio_types::ContentKey;
use regex_lite::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Inline citation as the retrieval engine writes it:
/// `(handle)` or `(handle pages R)`.
const CITATION_PATTERN: &str = r"\(([^)\s]+?)(?:\s+pages\s+([^)]+))?\)";

/// An answer whose inline citations use external tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitedAnswer {
    pub question: String,
    pub answer: String,
    /// One line per supporting context, in context order.
    pub references: Vec<Reference>,
    pub contexts: Vec<CitedContext>,
}

/// A supporting context, normalized for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitedContext {
    pub handle: String,
    pub citation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub summary: String,
    pub score: f64,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_key: Option<ContentKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DocumentDetail>,
}

/// A reference-list line: `@smith2020, p. 3-5 (smith.pdf)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub citation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.citation)?;
        if let Some(pages) = &self.pages {
            write!(f, ", p. {pages}")?;
        }
        if let Some(filename) = &self.filename {
            write!(f, " ({filename})")?;
        }
        Ok(())
    }
}

/// Rewrites inline handles into citation tokens.
#[derive(Debug, Clone)]
pub struct CitationRewriter {
    pattern: Regex,
}

impl CitationRewriter {
    pub fn new() -> CiteResult<Self> {
        Ok(Self {
            pattern: Regex::new(CITATION_PATTERN)?,
        })
    }

    /// Rewrites one answer.
    ///
    /// `(handle pages R)` becomes `[token, p. R]` and `(handle)` becomes
    /// `[token]`. The bare form is only rewritten for handles that appear in
    /// the answer's contexts, so ordinary parentheticals survive. A paged
    /// citation with an unknown handle keeps the handle as its token.
    pub fn rewrite(&self, answer: RawAnswer) -> CitedAnswer {
        let tokens: HashMap<String, String> = answer
            .contexts
            .iter()
            .map(|ctx| (ctx.handle().to_string(), citation_for(ctx)))
            .collect();

        let text = normalize_math(&answer.answer);
        let mut replaced = 0usize;
        let rewritten = self
            .pattern
            .replace_all(&text, |caps: &Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                let handle = caps.get(1).map_or("", |m| m.as_str());
                let pages = caps.get(2).map(|m| m.as_str().trim());
                match (tokens.get(handle), pages) {
                    (token, Some(pages)) => {
                        replaced += 1;
                        let token = token.map_or(handle, String::as_str);
                        format!("[{token}, p. {pages}]")
                    }
                    (Some(token), None) => {
                        replaced += 1;
                        format!("[{token}]")
                    }
                    (None, None) => whole.to_string(),
                }
            })
            .into_owned();
        debug!("Rewrote {} inline citations", replaced);

        let contexts: Vec<CitedContext> = answer.contexts.into_iter().map(cite_context).collect();
        let references = contexts
            .iter()
            .map(|ctx| Reference {
                citation: ctx.citation.clone(),
                pages: ctx.pages.clone(),
                filename: ctx.filename.clone(),
            })
            .collect();

        CitedAnswer {
            question: answer.question,
            answer: rewritten,
            references,
            contexts,
        }
    }
}

/// Rewrites one answer with a freshly compiled [`CitationRewriter`].
pub fn rewrite(answer: RawAnswer) -> CiteResult<CitedAnswer> {
    Ok(CitationRewriter::new()?.rewrite(answer))
}

/// Converts LaTeX bracket delimiters to dollar delimiters:
/// `\(`/`\)` become `$` and `\[`/`\]` become `$$`.
pub fn normalize_math(text: &str) -> String {
    text.replace("\\(", "$")
        .replace("\\)", "$")
        .replace("\\[", "$$")
        .replace("\\]", "$$")
}

fn citation_for(ctx: &AnswerContext) -> String {
    ctx.detail
        .as_ref()
        .and_then(DocumentDetail::citation_token)
        .unwrap_or_else(|| ctx.handle().to_string())
}

fn cite_context(ctx: AnswerContext) -> CitedContext {
    let citation = citation_for(&ctx);
    let pages = ctx.page_range();
    let handle = ctx.handle().to_string();
    let filename = ctx.detail.as_ref().and_then(DocumentDetail::display_filename);
    CitedContext {
        handle,
        citation,
        pages,
        filename,
        summary: normalize_math(&ctx.summary),
        score: ctx.score,
        excerpt: ctx.excerpt,
        content_key: ctx.content_key,
        detail: ctx.detail,
    }
}
