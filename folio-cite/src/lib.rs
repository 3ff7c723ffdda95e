//! Citation rewriting for generated answers.
//!
//! The retrieval engine cites its sources with internal handles such as
//! `(smith2020 pages 3-5)`. This crate turns them into the stable tokens
//! users know from their library, `[@smith2020, p. 3-5]`, and normalizes the
//! supporting contexts for presentation.

mod error;
mod rewrite;

pub use error::{CiteError, CiteResult};
pub use rewrite::{
    normalize_math, rewrite, CitationRewriter, CitedAnswer, CitedContext, Reference,
};
