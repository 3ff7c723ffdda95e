//! Document model for Folio.
//!
//! Defines the records that flow between the library, the metadata
//! providers, the derived index and the answer engine:
//! - [`LibraryDocument`]: a library record (id, attached files, raw JSON fields)
//! - [`DocumentDetail`]: the merged bibliographic record with field-ownership rules
//! - [`IndexEntry`]: one derived-index record keyed by content
//! - [`RawAnswer`]: an answer as produced by the retrieval engine, before citation rewriting
//!
//! These types are consumed by storage, sync and the citation rewriter.

mod answer;
mod detail;
mod entry;
mod library;

pub use answer::{AnswerContext, RawAnswer};
pub use detail::{DocumentDetail, OtherValue, Scalar, DEFAULT_OVERWRITE_FIELDS};
pub use entry::IndexEntry;
pub use library::{split_author_names, title_case, LibraryDocument, PersonName};
