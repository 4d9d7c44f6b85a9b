//! Capability seams between the engine and its collaborators.
//!
//! Each trait is a single capability. The engine composes implementations
//! generically, so the futures are spelled out as `impl Future + Send` to keep
//! them usable from multi-threaded tokio tasks.
use std::future::Future;

use crate::error::{LlmError, RetrievalError};
use crate::types::Chunk;

/// `(query, k) -> ordered chunks`, best first.
///
/// Implemented by the lexical index and, through an adapter, by every
/// [`VectorRetriever`].
pub trait Retriever: Send + Sync {
    fn retrieve(&self, query: &str, k: usize) -> impl Future<Output = Result<Vec<Chunk>, RetrievalError>> + Send;
}

/// Diversity-aware similarity search over embeddings.
///
/// Returns up to `k` chunks chosen from a pool of `fetch_k` nearest
/// neighbours (`fetch_k >= k`). Each chunk keeps the metadata it was stored
/// with.
pub trait VectorRetriever: Send + Sync {
    fn search(&self, query: &str, k: usize, fetch_k: usize) -> impl Future<Output = Result<Vec<Chunk>, RetrievalError>> + Send;
}

pub trait Embedder: Send + Sync {
    /// Stable identifier of the model behind this embedder.
    fn embedder_id(&self) -> &str;
    fn embed_batch(&self, texts: &[String]) -> impl Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send;
}

/// Raw text completion.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Turns an assembled context plus the user's question into prose.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, context: &str, question: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Pairs a vector retriever with a fixed candidate pool so it can stand in
/// wherever a plain [`Retriever`] is expected.
#[derive(Debug, Clone)]
pub struct Diversified<V> {
    pub inner: V,
    pub fetch_k: usize,
}

impl<V: VectorRetriever> Diversified<V> {
    pub fn new(inner: V, fetch_k: usize) -> Self { Self { inner, fetch_k } }
}

impl<V: VectorRetriever> Retriever for Diversified<V> {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        self.inner.search(query, k, self.fetch_k.max(k)).await
    }
}

impl<T: Retriever> Retriever for &T {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        (**self).retrieve(query, k).await
    }
}

impl<T: VectorRetriever> VectorRetriever for &T {
    async fn search(&self, query: &str, k: usize, fetch_k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        (**self).search(query, k, fetch_k).await
    }
}
