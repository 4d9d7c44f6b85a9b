use std::collections::HashSet;

use pretty_assertions::assert_eq;

use ragfuse_core::types::{Chunk, FusionWeights};
use ragfuse_hybrid::fuse;

fn chunks(names: &[&str]) -> Vec<Chunk> {
    names.iter().map(|n| Chunk::new(*n)).collect()
}

fn contents(result: &[ragfuse_core::types::ScoredChunk]) -> Vec<&str> {
    result.iter().map(|s| s.chunk.content.as_str()).collect()
}

#[test]
fn identical_inputs_give_identical_output() {
    let v = chunks(&["a", "b", "c"]);
    let l = chunks(&["c", "d", "a"]);
    let first = fuse(&v, &l, FusionWeights::default(), 4);
    for _ in 0..10 {
        assert_eq!(fuse(&v, &l, FusionWeights::default(), 4), first);
    }
}

#[test]
fn weights_are_normalized() {
    let v = chunks(&["a", "b"]);
    let l = chunks(&["b", "c"]);
    let doubled = FusionWeights::new(2.0, 2.0).expect("weights");
    assert_eq!(fuse(&v, &l, doubled, 3), fuse(&v, &l, FusionWeights::default(), 3));
}

#[test]
fn rank_scores_span_one_to_one_over_n() {
    let v = chunks(&["a", "b", "c", "d"]);
    let only_vector = FusionWeights::new(1.0, 0.0).expect("weights");
    let out = fuse(&v, &[], only_vector, 4);
    assert!((out[0].score - 1.0).abs() < 1e-6);
    assert!((out[3].score - 0.25).abs() < 1e-6);
}

#[test]
fn shared_chunk_collects_both_contributions_once() {
    let v = chunks(&["x", "a"]);
    let l = chunks(&["a", "y"]);
    let out = fuse(&v, &l, FusionWeights::default(), 10);
    let unique: HashSet<&str> = contents(&out).into_iter().collect();
    assert_eq!(unique.len(), out.len());
    // a: 0.5 * 1/2 from vector + 0.5 * 1 from lexical
    let a = out.iter().find(|s| s.chunk.content == "a").expect("a fused");
    assert!((a.score - 0.75).abs() < 1e-6);
    assert_eq!(contents(&out), vec!["a", "x", "y"]);
}

#[test]
fn ties_keep_vector_then_lexical_order() {
    let v = chunks(&["v1", "v2"]);
    let l = chunks(&["l1", "l2"]);
    let out = fuse(&v, &l, FusionWeights::default(), 4);
    assert_eq!(contents(&out), vec!["v1", "l1", "v2", "l2"]);
}

#[test]
fn empty_source_degrades_to_the_other_list() {
    let l = chunks(&["p", "q", "r"]);
    let out = fuse(&[], &l, FusionWeights::default(), 2);
    assert_eq!(contents(&out), vec!["p", "q"]);
    assert!(fuse(&[], &[], FusionWeights::default(), 5).is_empty());
}

#[test]
fn first_seen_instance_keeps_its_metadata() {
    let v = vec![Chunk::new("same").with_source("vector.md")];
    let l = vec![Chunk::new("same").with_source("lexical.md")];
    let out = fuse(&v, &l, FusionWeights::default(), 1);
    assert_eq!(out[0].chunk.source(), Some("vector.md"));
}
