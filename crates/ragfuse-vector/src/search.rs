use anyhow::{anyhow, Result};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use std::path::Path;
use tracing::debug;

use ragfuse_core::error::RetrievalError;
use ragfuse_core::traits::{Embedder, VectorRetriever};
use ragfuse_core::types::{Chunk, SourceKind};

use crate::mmr;
use crate::table::{chunks_from_batch, open_db, table_exists, vectors_from_batch};

/// Nearest-neighbour search against the LanceDB chunk table, re-ranked with
/// MMR so near-duplicate passages do not crowd out the rest.
pub struct LanceVectorRetriever<E> {
	db: Connection,
	table_name: String,
	embedder: E,
	lambda: f32,
}

impl<E: Embedder> LanceVectorRetriever<E> {
	pub async fn new(db_path: &Path, table_name: &str, embedder: E) -> Result<Self> {
		let db = open_db(db_path.to_string_lossy().as_ref()).await?;
		if !table_exists(&db, table_name).await? {
			return Err(anyhow!("table '{table_name}' not found in {}", db_path.display()));
		}
		Ok(Self { db, table_name: table_name.to_string(), embedder, lambda: mmr::DEFAULT_LAMBDA })
	}

	#[must_use]
	pub fn with_lambda(mut self, lambda: f32) -> Self {
		self.lambda = lambda.clamp(0.0, 1.0);
		self
	}

	async fn candidates(&self, query_vec: Vec<f32>, fetch_k: usize) -> Result<(Vec<Chunk>, Vec<Vec<f32>>)> {
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(query_vec)?.limit(fetch_k).execute().await?;
		let mut chunks = Vec::new();
		let mut vectors = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			chunks.extend(chunks_from_batch(&batch)?);
			vectors.extend(vectors_from_batch(&batch)?);
		}
		Ok((chunks, vectors))
	}
}

impl<E: Embedder> VectorRetriever for LanceVectorRetriever<E> {
	async fn search(&self, query: &str, k: usize, fetch_k: usize) -> Result<Vec<Chunk>, RetrievalError> {
		let unavailable = |e: anyhow::Error| RetrievalError::unavailable(SourceKind::Vector, e);
		if k == 0 { return Ok(vec![]); }
		let query_vec = self
			.embedder
			.embed_batch(&[query.to_string()])
			.await
			.map_err(unavailable)?
			.into_iter()
			.next()
			.ok_or_else(|| unavailable(anyhow!("embedder returned no query vector")))?;
		let (chunks, vectors) = self.candidates(query_vec.clone(), fetch_k.max(k)).await.map_err(unavailable)?;
		let picks = mmr::select(&query_vec, &vectors, k, self.lambda);
		debug!(query, pool = chunks.len(), picked = picks.len(), "lance vector search");
		Ok(picks.into_iter().filter_map(|i| chunks.get(i).cloned()).collect())
	}
}
