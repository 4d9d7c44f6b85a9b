//! ragfuse-lexical
//!
//! In-memory BM25 keyword ranking over the full corpus. See `index` for the
//! scorer and `tokenize` for the (deliberately simple) analyzer.
pub mod index;
pub mod tokenize;

pub use index::{Bm25Params, LexicalIndex};
pub use tokenize::tokenize;
