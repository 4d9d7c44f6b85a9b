//! ragfuse-hybrid
//!
//! Query-time pipeline: rank fusion of the vector and lexical signals, query
//! decomposition, context assembly across sub-queries and answer synthesis,
//! tied together by [`RagEngine`].
pub mod assemble;
pub mod decompose;
pub mod engine;
pub mod fusion;
pub mod retriever;
pub mod synthesize;

pub use assemble::ContextAssembler;
pub use decompose::QueryDecomposer;
pub use engine::RagEngine;
pub use fusion::fuse;
pub use retriever::{HybridRetriever, SourceResults};
pub use synthesize::PromptSynthesizer;
