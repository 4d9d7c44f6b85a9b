use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use ragfuse_core::error::RetrievalError;
use ragfuse_core::traits::Retriever;
use ragfuse_core::types::{Chunk, QueryOptions, RetrievalResult, SourceKind};

use crate::fusion::fuse;

/// Outcome of querying both signals for one query. Failures stay explicit
/// here; [`HybridRetriever::retrieve`] is where they are downgraded.
#[derive(Debug)]
pub struct SourceResults {
    pub vector: Result<Vec<Chunk>, RetrievalError>,
    pub lexical: Result<Vec<Chunk>, RetrievalError>,
}

impl SourceResults {
    /// Failed sources become empty lists, each logged once.
    pub fn degrade(self) -> (Vec<Chunk>, Vec<Chunk>) {
        (settle(self.vector), settle(self.lexical))
    }
}

fn settle(result: Result<Vec<Chunk>, RetrievalError>) -> Vec<Chunk> {
    result.unwrap_or_else(|e| {
        warn!(source = %e.kind(), error = %e, "retrieval source degraded to empty");
        Vec::new()
    })
}

/// Vector and lexical retrieval for a single query, fused by rank.
pub struct HybridRetriever<V, L> {
    vector: V,
    lexical: L,
}

impl<V: Retriever, L: Retriever> HybridRetriever<V, L> {
    pub fn new(vector: V, lexical: L) -> Self { Self { vector, lexical } }

    /// Both signals concurrently, each bounded by `timeout`.
    pub async fn retrieve_sources(&self, query: &str, source_k: usize, timeout: Duration) -> SourceResults {
        let (vector, lexical) = tokio::join!(
            bounded(SourceKind::Vector, timeout, self.vector.retrieve(query, source_k)),
            bounded(SourceKind::Lexical, timeout, self.lexical.retrieve(query, source_k)),
        );
        SourceResults { vector, lexical }
    }

    pub async fn retrieve(&self, query: &str, opts: &QueryOptions) -> RetrievalResult {
        let (vector, lexical) = self.retrieve_sources(query, opts.source_k, opts.retrieval_timeout).await.degrade();
        let fused = fuse(&vector, &lexical, opts.weights, opts.k_per_query);
        debug!(query, vector = vector.len(), lexical = lexical.len(), fused = fused.len(), "hybrid retrieval");
        fused
    }
}

async fn bounded<F>(kind: SourceKind, timeout: Duration, fut: F) -> Result<Vec<Chunk>, RetrievalError>
where
    F: Future<Output = Result<Vec<Chunk>, RetrievalError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(RetrievalError::Timeout { kind, after: timeout }),
    }
}
