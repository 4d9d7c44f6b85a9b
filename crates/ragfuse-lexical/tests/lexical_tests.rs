use std::sync::Arc;

use pretty_assertions::assert_eq;

use ragfuse_core::corpus::Corpus;
use ragfuse_core::traits::Retriever;
use ragfuse_core::types::Chunk;
use ragfuse_lexical::LexicalIndex;

const BREAK_RULES: &str = "Break rules: 5 minutes per hour.";
const PREGNANT: &str = "Pregnant workers get extra breaks.";
const NOT_COMBINED: &str = "Breaks cannot be combined.";

fn index(texts: &[&str]) -> LexicalIndex {
    let chunks = texts.iter().enumerate().map(|(i, t)| Chunk::new(*t).with_source(format!("doc{i}.md"))).collect();
    LexicalIndex::build(Arc::new(Corpus::new(chunks).expect("corpus")))
}

#[test]
fn keyword_query_ranks_matching_chunks_above_unrelated_ones() {
    let idx = index(&[BREAK_RULES, PREGNANT, NOT_COMBINED]);
    let scores = idx.score("combined pregnant");
    assert_eq!(scores[0], 0.0, "no overlap scores exactly zero");
    assert!(scores[1] > 0.0 && scores[2] > 0.0);

    let hits = idx.top_k("combined pregnant", 3);
    let contents: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    // shorter chunk wins on length normalization
    assert_eq!(contents, vec![NOT_COMBINED, PREGNANT]);
    assert!(hits[0].score >= hits[1].score);
}

#[test]
fn scores_are_non_negative_even_for_common_terms() {
    let idx = index(&["the cat", "the dog", "the bird", "a fish"]);
    for s in idx.score("the") { assert!(s >= 0.0); }
    assert!(idx.score("the")[0] > 0.0);
    let single = index(&["only one chunk here"]);
    assert!(single.score("chunk")[0] > 0.0);
}

#[test]
fn ties_keep_corpus_order_and_k_truncates() {
    let idx = index(&["apple pie", "banana", "apple tart", "apple cake"]);
    let hits = idx.top_k("apple", 2);
    let contents: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert_eq!(contents, vec!["apple pie", "apple tart"]);
    assert!(idx.top_k("zebra", 5).is_empty());
    assert!(idx.top_k("apple", 0).is_empty());
}

#[test]
fn query_tokenization_matches_index_tokenization() {
    let idx = index(&[BREAK_RULES, PREGNANT, NOT_COMBINED]);
    assert_eq!(idx.score("PREGNANT!"), idx.score("pregnant"));
}

#[tokio::test]
async fn retriever_returns_chunks_with_metadata() {
    let idx = index(&[BREAK_RULES, PREGNANT, NOT_COMBINED]);
    let chunks = idx.retrieve("pregnant workers", 8).await.expect("lexical retrieval never fails");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source(), Some("doc1.md"));
}

#[test]
fn term_in_half_the_corpus_still_retrieves_its_chunks() {
    let idx = index(&["pregnant workers rest", "pregnant staff leave", "fire exits", "parking rules"]);
    let hits = idx.top_k("pregnant", 5);
    let contents: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert_eq!(contents, vec!["pregnant workers rest", "pregnant staff leave"]);
}

#[test]
fn rarer_term_weighs_more_than_a_term_in_every_chunk() {
    let idx = index(&["apple pie", "banana pie"]);
    assert!(idx.score("apple")[0] > idx.score("pie")[0]);
    assert!(idx.score("pie").iter().all(|s| *s > 0.0));
    let hits = idx.top_k("apple pie", 5);
    assert_eq!(hits[0].chunk.content, "apple pie");
    assert_eq!(hits.len(), 2);
}
