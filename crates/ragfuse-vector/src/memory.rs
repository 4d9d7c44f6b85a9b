use anyhow::{anyhow, Result};
use tracing::{debug, info};

use ragfuse_core::error::RetrievalError;
use ragfuse_core::traits::{Embedder, VectorRetriever};
use ragfuse_core::types::{Chunk, SourceKind};

use crate::mmr;

/// Brute-force cosine search over embeddings held in memory.
pub struct MemoryVectorStore<E> {
    embedder: E,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    lambda: f32,
}

impl<E: Embedder> MemoryVectorStore<E> {
    /// Embeds every chunk up front, `batch_size` texts per embedder call.
    pub async fn from_chunks(embedder: E, chunks: Vec<Chunk>, batch_size: usize) -> Result<Self> {
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embedded = embedder.embed_batch(&texts).await?;
            if embedded.len() != batch.len() {
                return Err(anyhow!("embedder returned {} vectors for {} texts", embedded.len(), batch.len()));
            }
            vectors.extend(embedded);
        }
        info!(chunks = chunks.len(), embedder = embedder.embedder_id(), "in-memory vector store ready");
        Ok(Self { embedder, chunks, vectors, lambda: mmr::DEFAULT_LAMBDA })
    }

    #[must_use]
    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }

    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
}

impl<E: Embedder> VectorRetriever for MemoryVectorStore<E> {
    async fn search(&self, query: &str, k: usize, fetch_k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        let q = self
            .embedder
            .embed_batch(&[query.to_string()])
            .await
            .map_err(|e| RetrievalError::unavailable(SourceKind::Vector, e))?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::unavailable(SourceKind::Vector, "embedder returned no query vector"))?;

        let mut ranked: Vec<(usize, f32)> =
            self.vectors.iter().enumerate().map(|(i, v)| (i, mmr::cosine_similarity(&q, v))).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(fetch_k.max(k));

        let pool: Vec<Vec<f32>> = ranked.iter().map(|(i, _)| self.vectors[*i].clone()).collect();
        let picks = mmr::select(&q, &pool, k, self.lambda);
        debug!(query, pool = pool.len(), picked = picks.len(), "memory vector search");
        Ok(picks.into_iter().map(|p| self.chunks[ranked[p].0].clone()).collect())
    }
}
