use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use ragfuse_core::corpus::Corpus;
use ragfuse_core::traits::Retriever;
use ragfuse_core::types::{AssembledContext, Chunk, QueryOptions, UNKNOWN_SOURCE};

use crate::retriever::HybridRetriever;

/// Gathers one deduplicated context across all sub-queries of a question.
pub struct ContextAssembler {
    corpus: Arc<Corpus>,
}

impl ContextAssembler {
    pub fn new(corpus: Arc<Corpus>) -> Self { Self { corpus } }

    /// Retrieves every sub-query concurrently, then keeps each content the
    /// first time it appears, walking sub-queries in order. Sources are
    /// reported in first-seen order; chunks without one count as
    /// [`UNKNOWN_SOURCE`].
    pub async fn assemble<V, L>(&self, hybrid: &HybridRetriever<V, L>, subqueries: &[String], opts: &QueryOptions) -> AssembledContext
    where
        V: Retriever,
        L: Retriever,
    {
        let per_query = join_all(subqueries.iter().map(|q| hybrid.retrieve(q, opts))).await;

        let mut seen_content: HashSet<String> = HashSet::new();
        let mut seen_source: HashSet<String> = HashSet::new();
        let mut chunks = Vec::new();
        let mut sources = Vec::new();
        for (query, results) in subqueries.iter().zip(per_query) {
            let before = chunks.len();
            for scored in results {
                if !seen_content.insert(scored.chunk.content.clone()) { continue; }
                let source = scored.chunk.source().unwrap_or(UNKNOWN_SOURCE).to_string();
                if seen_source.insert(source.clone()) { sources.push(source); }
                chunks.push(scored.chunk);
            }
            debug!(subquery = %query, new_chunks = chunks.len() - before, "sub-query merged");
        }
        AssembledContext::from_parts(chunks, sources)
    }

    /// The chunk's content with `window` corpus neighbors on each side.
    pub fn expand_neighbors(&self, chunk: &Chunk, window: usize) -> String {
        self.corpus.expand_neighbors(&chunk.content, window)
    }

    /// Synthesis context: chunk contents (expanded when `window > 0`) joined
    /// by the context separator.
    pub fn context_text(&self, context: &AssembledContext, window: usize) -> String {
        if window == 0 {
            return context.to_context_text();
        }
        context
            .chunks()
            .iter()
            .map(|c| self.expand_neighbors(c, window))
            .collect::<Vec<_>>()
            .join(ragfuse_core::types::CONTEXT_SEPARATOR)
    }
}
