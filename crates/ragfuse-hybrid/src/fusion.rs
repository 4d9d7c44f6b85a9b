//! Weighted rank fusion of two best-first chunk lists.
use std::collections::{HashMap, HashSet};

use ragfuse_core::types::{Chunk, FusionWeights, RetrievalResult, ScoredChunk, SourceKind};

/// `(n - pos) / n`: 1.0 for the head of a list of length `n`, `1/n` for its
/// tail.
#[allow(clippy::cast_precision_loss)]
pub fn rank_score(pos: usize, n: usize) -> f32 {
    if n == 0 || pos >= n { return 0.0; }
    (n - pos) as f32 / n as f32
}

/// Merges the two lists into at most `k` chunks, best first.
///
/// Each list contributes `weight * rank_score` to every chunk it contains;
/// a chunk present in both lists collects both terms. Chunks are identified
/// by content. Equal scores keep first-seen order, vector list first.
pub fn fuse(vector: &[Chunk], lexical: &[Chunk], weights: FusionWeights, k: usize) -> RetrievalResult {
    let mut fused: Vec<ScoredChunk> = Vec::with_capacity(vector.len() + lexical.len());
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for (kind, list) in [(SourceKind::Vector, vector), (SourceKind::Lexical, lexical)] {
        let distinct = first_occurrences(list);
        let weight = weights.for_kind(kind);
        let n = distinct.len();
        for (pos, chunk) in distinct.into_iter().enumerate() {
            let contribution = weight * rank_score(pos, n);
            if let Some(&slot) = slots.get(chunk.content.as_str()) {
                fused[slot].score += contribution;
            } else {
                slots.insert(chunk.content.as_str(), fused.len());
                fused.push(ScoredChunk { chunk: chunk.clone(), score: contribution });
            }
        }
    }

    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused.truncate(k);
    fused
}

fn first_occurrences(list: &[Chunk]) -> Vec<&Chunk> {
    let mut seen = HashSet::new();
    list.iter().filter(|c| seen.insert(c.content.as_str())).collect()
}
