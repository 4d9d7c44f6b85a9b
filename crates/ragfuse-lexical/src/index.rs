use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use ragfuse_core::corpus::Corpus;
use ragfuse_core::error::RetrievalError;
use ragfuse_core::traits::Retriever;
use ragfuse_core::types::{Chunk, RetrievalResult, ScoredChunk};

use crate::tokenize::tokenize;

/// Okapi BM25 constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: 1.5, b: 0.75 } }
}

/// Keyword index over the whole corpus. Built once, immutable afterwards, so
/// it can be shared across concurrent retrievals without locking.
#[derive(Debug)]
pub struct LexicalIndex {
    corpus: Arc<Corpus>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f32,
    idf: HashMap<String, f32>,
    params: Bm25Params,
}

impl LexicalIndex {
    pub fn build(corpus: Arc<Corpus>) -> Self { Self::with_params(corpus, Bm25Params::default()) }

    pub fn with_params(corpus: Arc<Corpus>, params: Bm25Params) -> Self {
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lens = Vec::with_capacity(corpus.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        for chunk in corpus.chunks() {
            let tokens = tokenize(&chunk.content);
            doc_lens.push(tokens.len());
            let mut tf: HashMap<String, u32> = HashMap::new();
            for t in tokens { *tf.entry(t).or_insert(0) += 1; }
            for term in tf.keys() { *doc_freq.entry(term.clone()).or_insert(0) += 1; }
            term_freqs.push(tf);
        }

        #[allow(clippy::cast_precision_loss)]
        let n_docs = corpus.len() as f32;
        #[allow(clippy::cast_precision_loss)]
        let avg_doc_len = doc_lens.iter().sum::<usize>() as f32 / n_docs;

        // ln(1 + x): positive for every df and shrinking as df grows
        let idf: HashMap<String, f32> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                #[allow(clippy::cast_precision_loss)]
                let df = df as f32;
                (term, ((n_docs - df + 0.5) / (df + 0.5)).ln_1p())
            })
            .collect();

        info!(chunks = corpus.len(), terms = idf.len(), "lexical index built");
        Self { corpus, term_freqs, doc_lens, avg_doc_len, idf, params }
    }

    pub fn corpus(&self) -> &Arc<Corpus> { &self.corpus }

    /// One non-negative score per corpus chunk, in corpus order. Chunks that
    /// share no token with the query score exactly 0.
    pub fn score(&self, query: &str) -> Vec<f32> {
        let query_tokens = tokenize(query);
        let Bm25Params { k1, b, .. } = self.params;
        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(tf, &len)| {
                #[allow(clippy::cast_precision_loss)]
                let len_norm = if self.avg_doc_len > 0.0 { len as f32 / self.avg_doc_len } else { 1.0 };
                query_tokens
                    .iter()
                    .filter_map(|q| Some((self.idf.get(q)?, *tf.get(q)?)))
                    .map(|(idf, f)| {
                        #[allow(clippy::cast_precision_loss)]
                        let f = f as f32;
                        idf * (f * (k1 + 1.0)) / (f + k1 * (1.0 - b + b * len_norm))
                    })
                    .sum()
            })
            .collect()
    }

    /// The `k` best-scoring chunks with a positive score. Equal scores keep
    /// corpus order.
    pub fn top_k(&self, query: &str, k: usize) -> RetrievalResult {
        let scores = self.score(query);
        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().filter(|(_, s)| *s > 0.0).collect();
        // sort_by is stable, so ties stay in corpus order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        debug!(query, hits = ranked.len(), "lexical top-k");
        ranked
            .into_iter()
            .filter_map(|(i, score)| self.corpus.get(i).map(|c| ScoredChunk { chunk: c.clone(), score }))
            .collect()
    }
}

impl Retriever for LexicalIndex {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        Ok(self.top_k(query, k).into_iter().map(|s| s.chunk).collect())
    }
}
