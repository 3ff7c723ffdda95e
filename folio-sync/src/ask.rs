//! The query path: question in, cited answer out.

use crate::config::QueryConfig;
use crate::error::SyncResult;
use crate::retrieval::{QueryOptions, RetrievalEngine};
use folio_cite::{CitationRewriter, CitedAnswer};
use folio_storage::IndexStore;
use tracing::{debug, info};

/// Answers `question` from the index in `store`.
///
/// Returns `Ok(None)` when nothing has been indexed yet. Each supporting
/// context gets the merged metadata of the entry its content key names
/// before citations are rewritten.
pub async fn ask(
    store: &IndexStore,
    retrieval: &dyn RetrievalEngine,
    question: &str,
    config: &QueryConfig,
) -> SyncResult<Option<CitedAnswer>> {
    config.validate()?;
    debug!(
        "Asking with evidence_k={}, max_sources={}",
        config.evidence_k, config.max_sources
    );

    let index = match store.load()? {
        Some(index) if !index.is_empty() => index,
        _ => {
            info!("The index is empty. Please index some files before asking questions.");
            return Ok(None);
        }
    };

    let mut raw = retrieval.query(question, &QueryOptions::from(config)).await?;
    for context in &mut raw.contexts {
        if context.detail.is_some() {
            continue;
        }
        if let Some(entry) = context.content_key.as_ref().and_then(|k| index.get(k)) {
            context.detail = Some(entry.detail.clone());
        }
    }

    let rewriter = CitationRewriter::new()?;
    Ok(Some(rewriter.rewrite(raw)))
}
