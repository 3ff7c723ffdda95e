//! The retrieval engine seam.
//!
//! Folio does not search, embed or generate. It hands files to an engine
//! under a content key, removes them again, and asks it questions.

use crate::config::QueryConfig;
use crate::error::RetrievalError;
use async_trait::async_trait;
use folio_model::RawAnswer;
use folio_types::ContentKey;
use std::path::PathBuf;

/// A file handed to the engine for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub path: PathBuf,
    pub content_key: ContentKey,
    /// Suggested chunk-name prefix. The engine may pick another.
    pub docname: String,
    /// Citation token the engine should attach to the document.
    pub citation: String,
}

/// Answering parameters passed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub evidence_k: usize,
    pub max_sources: usize,
    pub answer_length: String,
    pub llm: Option<String>,
    pub summary_llm: Option<String>,
    pub embedding: Option<String>,
}

impl From<&QueryConfig> for QueryOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            evidence_k: config.evidence_k,
            max_sources: config.max_sources,
            answer_length: config.answer_length.clone(),
            llm: config.llm.clone(),
            summary_llm: config.summary_llm.clone(),
            embedding: config.embedding.clone(),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

/// A document retrieval and answering engine.
#[async_trait]
pub trait RetrievalEngine: Send + Sync {
    /// Ingests a file. Returns the document name the engine assigned.
    async fn ingest(&self, request: IngestRequest) -> Result<String, RetrievalError>;

    /// Removes everything ingested under `key`. Removing an unknown key is
    /// not an error.
    async fn remove(&self, key: &ContentKey) -> Result<(), RetrievalError>;

    /// Answers a question. Contexts name their source by content key.
    async fn query(&self, question: &str, options: &QueryOptions) -> Result<RawAnswer, RetrievalError>;
}

/// In-memory engine for tests.
pub mod mock {
    use super::*;
    use folio_model::AnswerContext;
    use std::collections::{BTreeMap, HashSet};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    /// A document held by [`MockRetrieval`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockDocument {
        pub docname: String,
        pub citation: String,
        pub path: PathBuf,
    }

    /// Keeps ingested documents in a map and answers with one context per
    /// document.
    #[derive(Debug, Default)]
    pub struct MockRetrieval {
        documents: Mutex<BTreeMap<ContentKey, MockDocument>>,
        rejected: Mutex<HashSet<PathBuf>>,
        failing_removals: Mutex<HashSet<ContentKey>>,
        answer: Mutex<Option<RawAnswer>>,
        ingest_calls: AtomicUsize,
        remove_calls: AtomicUsize,
        last_options: Mutex<Option<QueryOptions>>,
    }

    impl MockRetrieval {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes ingestion of `path` fail as unrecognized content.
        pub fn reject(&self, path: impl Into<PathBuf>) {
            lock(&self.rejected).insert(path.into());
        }

        /// Makes removal of `key` fail.
        pub fn fail_removal(&self, key: ContentKey) {
            lock(&self.failing_removals).insert(key);
        }

        /// Fixes the answer returned by [`RetrievalEngine::query`].
        pub fn set_answer(&self, answer: RawAnswer) {
            *lock(&self.answer) = Some(answer);
        }

        pub fn contains(&self, key: &ContentKey) -> bool {
            lock(&self.documents).contains_key(key)
        }

        pub fn document(&self, key: &ContentKey) -> Option<MockDocument> {
            lock(&self.documents).get(key).cloned()
        }

        pub fn keys(&self) -> Vec<ContentKey> {
            lock(&self.documents).keys().cloned().collect()
        }

        pub fn len(&self) -> usize {
            lock(&self.documents).len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        pub fn ingest_calls(&self) -> usize {
            self.ingest_calls.load(Ordering::SeqCst)
        }

        pub fn remove_calls(&self) -> usize {
            self.remove_calls.load(Ordering::SeqCst)
        }

        pub fn last_options(&self) -> Option<QueryOptions> {
            lock(&self.last_options).clone()
        }

        fn unique_docname(documents: &BTreeMap<ContentKey, MockDocument>, wanted: &str) -> String {
            let taken = |name: &str| documents.values().any(|d| d.docname == name);
            if !taken(wanted) {
                return wanted.to_string();
            }
            (2..)
                .map(|n| format!("{wanted}-{n}"))
                .find(|name| !taken(name))
                .unwrap_or_else(|| wanted.to_string())
        }
    }

    #[async_trait]
    impl RetrievalEngine for MockRetrieval {
        async fn ingest(&self, request: IngestRequest) -> Result<String, RetrievalError> {
            self.ingest_calls.fetch_add(1, Ordering::SeqCst);
            if lock(&self.rejected).contains(&request.path) {
                return Err(RetrievalError::Unrecognized(display(&request.path)));
            }
            let mut documents = lock(&self.documents);
            let docname = Self::unique_docname(&documents, &request.docname);
            documents.insert(
                request.content_key,
                MockDocument {
                    docname: docname.clone(),
                    citation: request.citation,
                    path: request.path,
                },
            );
            Ok(docname)
        }

        async fn remove(&self, key: &ContentKey) -> Result<(), RetrievalError> {
            self.remove_calls.fetch_add(1, Ordering::SeqCst);
            if lock(&self.failing_removals).contains(key) {
                return Err(RetrievalError::Backend(format!("cannot remove {key}")));
            }
            lock(&self.documents).remove(key);
            Ok(())
        }

        async fn query(&self, question: &str, options: &QueryOptions) -> Result<RawAnswer, RetrievalError> {
            *lock(&self.last_options) = Some(options.clone());
            if let Some(answer) = lock(&self.answer).clone() {
                return Ok(RawAnswer {
                    question: question.to_string(),
                    ..answer
                });
            }

            let documents = lock(&self.documents);
            let mut text = format!("Answer to: {question}");
            let mut contexts = Vec::new();
            for (key, doc) in documents.iter().take(options.max_sources) {
                text.push_str(&format!(" ({} pages 1-2)", doc.docname));
                contexts.push(AnswerContext {
                    summary: format!("Summary of {}", doc.docname),
                    score: 1.0,
                    excerpt: format!("Excerpt from {}", display(&doc.path)),
                    content_key: Some(key.clone()),
                    ..AnswerContext::new(format!("{} pages 1-2", doc.docname))
                });
            }
            Ok(RawAnswer {
                question: question.to_string(),
                answer: text,
                contexts,
            })
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn display(path: &Path) -> String {
        path.display().to_string()
    }
}
