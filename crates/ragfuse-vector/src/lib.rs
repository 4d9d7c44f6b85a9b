//! ragfuse-vector
//!
//! Vector retrieval over chunk embeddings. `LanceVectorRetriever` searches a
//! LanceDB table written by `LanceDbWriter`; `MemoryVectorStore` does the same
//! brute-force over an in-process corpus. Both re-rank their candidate pool
//! with maximal marginal relevance (see [`mmr`]).
pub mod memory;
pub mod mmr;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use memory::MemoryVectorStore;
pub use search::LanceVectorRetriever;
pub use table::{load_corpus, open_db};
pub use writer::LanceDbWriter;
