//! Maximal Marginal Relevance selection.

/// Default relevance/diversity trade-off (1.0 = pure relevance).
pub const DEFAULT_LAMBDA: f32 = 0.5;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

/// Indices of up to `k` candidates, in selection order.
///
/// Each step picks the candidate maximizing
/// `lambda * sim(query, c) - (1 - lambda) * max(sim(c, selected))`.
/// Equal scores resolve to the earlier candidate, so a relevance-ordered
/// candidate list stays stable under ties.
pub fn select(query: &[f32], candidates: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    let k = k.min(candidates.len());
    if k == 0 { return vec![]; }
    let relevance: Vec<f32> = candidates.iter().map(|c| cosine_similarity(query, c)).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k);
    // running max similarity of each candidate to anything already selected
    let mut redundancy = vec![f32::NEG_INFINITY; candidates.len()];

    while selected.len() < k {
        let mut best: Option<(usize, f32)> = None;
        for (i, rel) in relevance.iter().enumerate() {
            if selected.contains(&i) { continue; }
            let penalty = if selected.is_empty() { 0.0 } else { redundancy[i] };
            let score = lambda * rel - (1.0 - lambda) * penalty;
            if best.map_or(true, |(_, s)| score > s) { best = Some((i, score)); }
        }
        let Some((pick, _)) = best else { break };
        selected.push(pick);
        for (i, c) in candidates.iter().enumerate() {
            let sim = cosine_similarity(c, &candidates[pick]);
            if sim > redundancy[i] { redundancy[i] = sim; }
        }
    }
    selected
}
