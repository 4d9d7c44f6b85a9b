//! Domain types shared by the lexical, vector and fusion layers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

pub type Meta = HashMap<String, String>;

/// Metadata key holding the chunk's origin (usually a file path).
pub const SOURCE_KEY: &str = "source";

/// Reported for chunks that carry no `source` metadata.
pub const UNKNOWN_SOURCE: &str = "unknown source";

/// Separator placed between chunk contents in the synthesis context.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Marker placed between a chunk and its neighbors when expanding context.
pub const ELISION_MARKER: &str = "\n[...]\n";

/// A unit of retrievable text.
///
/// Two chunks are the same passage when their `content` is byte-for-byte
/// equal; both retrieval signals hand back content rather than stable ids, so
/// content is the only usable deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl Chunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), metadata: Meta::new() }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.insert(SOURCE_KEY.to_string(), source.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A chunk paired with the score that ranked it. Higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ordered best-first, at most `k` entries.
pub type RetrievalResult = Vec<ScoredChunk>;

/// Indicates which retrieval signal produced (or failed to produce) a list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Vector,
    Lexical,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => f.write_str("vector"),
            Self::Lexical => f.write_str("lexical"),
        }
    }
}

/// Relative weight of each retrieval signal during rank fusion.
///
/// Always stored normalized so the two weights sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; 2]", into = "[f32; 2]")]
pub struct FusionWeights {
    vector: f32,
    lexical: f32,
}

impl FusionWeights {
    pub fn new(vector: f32, lexical: f32) -> Result<Self> {
        if !vector.is_finite() || !lexical.is_finite() || vector < 0.0 || lexical < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "fusion weights must be finite and non-negative, got [{vector}, {lexical}]"
            )));
        }
        let total = vector + lexical;
        if total <= 0.0 {
            return Err(Error::InvalidConfig("fusion weights must not both be zero".to_string()));
        }
        Ok(Self { vector: vector / total, lexical: lexical / total })
    }

    pub fn vector(&self) -> f32 { self.vector }
    pub fn lexical(&self) -> f32 { self.lexical }

    pub fn for_kind(&self, kind: SourceKind) -> f32 {
        match kind {
            SourceKind::Vector => self.vector,
            SourceKind::Lexical => self.lexical,
        }
    }
}

impl Default for FusionWeights {
    fn default() -> Self { Self { vector: 0.5, lexical: 0.5 } }
}

impl TryFrom<[f32; 2]> for FusionWeights {
    type Error = Error;
    fn try_from(value: [f32; 2]) -> Result<Self> { Self::new(value[0], value[1]) }
}

impl From<FusionWeights> for [f32; 2] {
    fn from(value: FusionWeights) -> Self { [value.vector, value.lexical] }
}

/// Per-call retrieval parameters.
///
/// Passed explicitly through `ask`/`retrieve` so experiments with larger
/// result sets never touch shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Fused chunks kept per sub-query.
    pub k_per_query: usize,
    /// Chunks requested from each retrieval signal before fusion.
    pub source_k: usize,
    /// Candidate pool for the vector retriever's diversity selection.
    pub fetch_k: usize,
    pub weights: FusionWeights,
    /// Split the question into sub-questions before retrieval.
    pub decompose: bool,
    /// Neighbor window used when building the synthesis context; 0 disables.
    pub expand_neighbors: usize,
    pub retrieval_timeout: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            k_per_query: 8,
            source_k: 8,
            fetch_k: 16,
            weights: FusionWeights::default(),
            decompose: true,
            expand_neighbors: 0,
            retrieval_timeout: Duration::from_secs(30),
        }
    }
}

/// Deduplicated passages gathered across every sub-query of one question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    chunks: Vec<Chunk>,
    sources: Vec<String>,
}

impl AssembledContext {
    pub fn from_parts(chunks: Vec<Chunk>, sources: Vec<String>) -> Self {
        Self { chunks, sources }
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn sources(&self) -> &[String] { &self.sources }
    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    /// Chunk contents joined with [`CONTEXT_SEPARATOR`], in assembled order.
    pub fn to_context_text(&self) -> String {
        self.chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
    }

    pub fn into_parts(self) -> (Vec<Chunk>, Vec<String>) { (self.chunks, self.sources) }
}

/// Final product of one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
    pub chunks: Vec<Chunk>,
    pub subqueries: Vec<String>,
    pub num_chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub total_chunks: usize,
    pub unique_sources: usize,
    pub retrieval_mode: &'static str,
}
