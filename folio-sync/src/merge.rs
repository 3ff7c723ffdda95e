//! Field-ownership merge of metadata records.
//!
//! The primary record comes from the library. Secondary records from
//! enrichment providers fold into it left to right: they fill fields the
//! accumulator lacks and overwrite only fields named in the allow-set.
//! Auxiliary `other` values accumulate instead of replacing each other.

use folio_model::DocumentDetail;
use std::collections::BTreeSet;

macro_rules! fill_fields {
    ($acc:expr, $src:expr, $allow:expr; $($field:ident),+ $(,)?) => {
        $(
            if $src.$field.is_some()
                && ($acc.$field.is_none() || $allow.contains(stringify!($field)))
            {
                $acc.$field = $src.$field.take();
            }
        )+
    };
}

macro_rules! clear_unrequested {
    ($detail:expr, $keep:expr; $($field:ident),+ $(,)?) => {
        $(
            if !$keep(stringify!($field)) {
                $detail.$field = None;
            }
        )+
    };
}

/// Merges `secondaries` into `primary`.
///
/// The result carries `allow` as its overwrite set so later merges into the
/// same record keep respecting it. Deterministic for a given input order.
pub fn merge(
    primary: DocumentDetail,
    secondaries: impl IntoIterator<Item = DocumentDetail>,
    allow: &BTreeSet<String>,
) -> DocumentDetail {
    let mut acc = primary;
    for secondary in secondaries {
        merge_into(&mut acc, secondary, allow);
    }
    acc.overwrite_allow = allow.clone();
    acc
}

/// Folds one secondary record into `acc`.
pub fn merge_into(acc: &mut DocumentDetail, mut incoming: DocumentDetail, allow: &BTreeSet<String>) {
    fill_fields!(acc, incoming, allow;
        key, docname, citation, title, authors, year, publication_date, doi,
        journal, volume, issue, publisher, issn, pages, url, bibtex_type,
        citation_count, source_quality, is_retracted, file_location, doc_id,
    );

    for (key, value) in std::mem::take(&mut incoming.other) {
        if allow.contains(&key) {
            acc.set_other(&key, value);
        } else {
            acc.insert_other(&key, value);
        }
    }
}

/// Drops the structured fields of `detail` not named in `fields`.
///
/// Auxiliary values are kept; they never overwrite anything.
pub fn restrict_fields(mut detail: DocumentDetail, fields: &[String]) -> DocumentDetail {
    let keep = |name: &str| fields.iter().any(|f| f == name);
    clear_unrequested!(detail, keep;
        key, docname, citation, title, authors, year, publication_date, doi,
        journal, volume, issue, publisher, issn, pages, url, bibtex_type,
        citation_count, source_quality, is_retracted, file_location, doc_id,
    );
    detail
}

/// The part of an earlier record that `fresh` cannot supply again.
///
/// Keeps the structured `fields` of `previous` and the auxiliary keys that
/// `fresh` does not carry. Fold the result in with an empty allow-set so it
/// only fills gaps.
pub fn carry_forward(
    previous: &DocumentDetail,
    fields: &[String],
    fresh: &DocumentDetail,
) -> DocumentDetail {
    let mut carried = restrict_fields(previous.clone(), fields);
    carried.other.retain(|key, _| !fresh.other.contains_key(key));
    carried
}
