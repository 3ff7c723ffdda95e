use folio_cite::{normalize_math, rewrite, CitationRewriter, Reference};
use folio_model::{AnswerContext, DocumentDetail, RawAnswer};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn detail_with_ref(reference: &str) -> DocumentDetail {
    let mut detail = DocumentDetail {
        file_location: Some(PathBuf::from("/library/smith/smith2020.pdf")),
        ..Default::default()
    };
    detail.set_other("ref", reference);
    detail
}

fn context(name: &str, detail: Option<DocumentDetail>) -> AnswerContext {
    AnswerContext {
        summary: "Relevant passage.".into(),
        score: 8.0,
        detail,
        ..AnswerContext::new(name)
    }
}

fn answer(text: &str, contexts: Vec<AnswerContext>) -> RawAnswer {
    RawAnswer {
        question: "What happened?".into(),
        answer: text.into(),
        contexts,
    }
}

#[test]
fn paged_handle_becomes_citation_with_pages() {
    let raw = answer(
        "Growth was linear (doc1 pages 3-5).",
        vec![context("doc1 pages 3-5", Some(detail_with_ref("smith2020")))],
    );
    let cited = rewrite(raw).unwrap();
    assert_eq!(cited.answer, "Growth was linear [@smith2020, p. 3-5].");
}

#[test]
fn bare_known_handle_becomes_citation() {
    let raw = answer(
        "See (doc1) for details.",
        vec![context("doc1 pages 1-2", Some(detail_with_ref("smith2020")))],
    );
    assert_eq!(rewrite(raw).unwrap().answer, "See [@smith2020] for details.");
}

#[test]
fn library_id_is_used_without_ref() {
    let mut detail = DocumentDetail::default();
    detail.set_other("library_id", "a1b2c3");
    let raw = answer("Claim (doc1 pages 7).", vec![context("doc1 pages 7", Some(detail))]);
    assert_eq!(rewrite(raw).unwrap().answer, "Claim [@a1b2c3, p. 7].");
}

#[test]
fn raw_handle_is_used_without_any_key() {
    let raw = answer("Claim (doc1 pages 7).", vec![context("doc1 pages 7", None)]);
    assert_eq!(rewrite(raw).unwrap().answer, "Claim [doc1, p. 7].");
}

#[test]
fn unknown_paged_handle_keeps_handle() {
    let raw = answer("Claim (other9 pages 2-3).", vec![]);
    assert_eq!(rewrite(raw).unwrap().answer, "Claim [other9, p. 2-3].");
}

#[test]
fn text_without_citations_is_unchanged() {
    let text = "No citations here, just (some aside) and (x).";
    let raw = answer(text, vec![context("doc1 pages 1", Some(detail_with_ref("k")))]);
    assert_eq!(rewrite(raw).unwrap().answer, text);
}

#[test]
fn several_citations_in_one_answer() {
    let raw = answer(
        "First (doc1 pages 1-2), then (doc2 pages 9), and (doc1).",
        vec![
            context("doc1 pages 1-2", Some(detail_with_ref("alpha"))),
            context("doc2 pages 9", Some(detail_with_ref("beta"))),
        ],
    );
    assert_eq!(
        rewrite(raw).unwrap().answer,
        "First [@alpha, p. 1-2], then [@beta, p. 9], and [@alpha]."
    );
}

#[test]
fn rewriting_twice_changes_nothing() {
    let rewriter = CitationRewriter::new().unwrap();
    let contexts = vec![context("doc1 pages 3-5", Some(detail_with_ref("smith2020")))];
    let once = rewriter.rewrite(answer("Claim (doc1 pages 3-5).", contexts.clone()));
    let twice = rewriter.rewrite(answer(&once.answer, contexts));
    assert_eq!(once.answer, twice.answer);
}

#[test]
fn math_delimiters_are_normalized() {
    assert_eq!(normalize_math(r"Let \(x^2\) and \[y\]."), "Let $x^2$ and $$y$$.");
    assert_eq!(normalize_math("plain"), "plain");
}

#[test]
fn math_normalization_runs_before_citations() {
    let raw = answer(
        r"Value \(x\) rises (doc1 pages 4).",
        vec![context("doc1 pages 4", Some(detail_with_ref("smith2020")))],
    );
    assert_eq!(rewrite(raw).unwrap().answer, "Value $x$ rises [@smith2020, p. 4].");
}

#[test]
fn contexts_are_normalized() {
    let mut ctx = context("doc1 pages 3-5", Some(detail_with_ref("smith2020")));
    ctx.summary = r"About \(n\) items.".into();
    ctx.excerpt = "Raw excerpt".into();
    let cited = rewrite(answer("x", vec![ctx])).unwrap();

    let c = &cited.contexts[0];
    assert_eq!(c.handle, "doc1");
    assert_eq!(c.citation, "@smith2020");
    assert_eq!(c.pages.as_deref(), Some("3-5"));
    assert_eq!(c.filename.as_deref(), Some("smith2020.pdf"));
    assert_eq!(c.summary, "About $n$ items.");
    assert_eq!(c.excerpt, "Raw excerpt");
    assert_eq!(c.score, 8.0);
}

#[test]
fn explicit_pages_win_over_name() {
    let mut ctx = context("doc1 pages 3-5", None);
    ctx.pages = Some("10".into());
    let cited = rewrite(answer("x", vec![ctx])).unwrap();
    assert_eq!(cited.contexts[0].pages.as_deref(), Some("10"));
}

#[test]
fn references_follow_context_order() {
    let cited = rewrite(answer(
        "x",
        vec![
            context("doc1 pages 3-5", Some(detail_with_ref("smith2020"))),
            context("doc2", None),
        ],
    ))
    .unwrap();

    assert_eq!(
        cited.references,
        vec![
            Reference {
                citation: "@smith2020".into(),
                pages: Some("3-5".into()),
                filename: Some("smith2020.pdf".into()),
            },
            Reference {
                citation: "doc2".into(),
                pages: None,
                filename: None,
            },
        ]
    );
    assert_eq!(cited.references[0].to_string(), "@smith2020, p. 3-5 (smith2020.pdf)");
    assert_eq!(cited.references[1].to_string(), "doc2");
}

#[test]
fn cited_answer_serializes() {
    let cited = rewrite(answer(
        "Claim (doc1 pages 2).",
        vec![context("doc1 pages 2", Some(detail_with_ref("smith2020")))],
    ))
    .unwrap();
    let json = serde_json::to_value(&cited).unwrap();
    assert_eq!(json["answer"], "Claim [@smith2020, p. 2].");
    assert_eq!(json["contexts"][0]["citation"], "@smith2020");
    assert_eq!(json["references"][0]["pages"], "2");
}
