use anyhow::{anyhow, Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use ragfuse_core::traits::Embedder;
use ragfuse_core::types::Chunk;

use crate::schema::build_chunk_schema;
use crate::table::{open_db, table_exists};

/// Embeds chunks and appends them to a LanceDB table, creating it on first
/// write.
pub struct LanceDbWriter {
	db: Connection,
	table_name: String,
}

impl LanceDbWriter {
	pub async fn new(db_path: &Path, table_name: &str) -> Result<Self> {
		std::fs::create_dir_all(db_path).with_context(|| format!("creating {}", db_path.display()))?;
		let db = open_db(db_path.to_string_lossy().as_ref()).await?;
		Ok(Self { db, table_name: table_name.to_string() })
	}

	/// Clears existing rows so a re-index does not duplicate them.
	pub async fn reset(&self) -> Result<()> {
		if table_exists(&self.db, &self.table_name).await? {
			warn!(table = %self.table_name, "clearing existing table");
			self.db.open_table(&self.table_name).execute().await?.delete("true").await?;
		}
		Ok(())
	}

	/// Returns the number of rows written.
	pub async fn write<E: Embedder>(&self, chunks: &[Chunk], embedder: &E, batch_size: usize) -> Result<usize> {
		if chunks.is_empty() { info!("no chunks to write"); return Ok(0); }
		info!(chunks = chunks.len(), table = %self.table_name, embedder = embedder.embedder_id(), "writing chunks to lancedb");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(
			ProgressStyle::default_bar()
				.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
				.map_err(|e| anyhow!("progress template: {e}"))?
				.progress_chars("#>-"),
		);
		let mut written = 0usize;
		for batch in chunks.chunks(batch_size.max(1)) {
			let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
			let vectors = embedder.embed_batch(&texts).await?;
			if vectors.len() != batch.len() {
				return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), batch.len()));
			}
			self.insert_batch(batch, vectors).await?;
			written += batch.len();
			pb.set_position(written as u64);
		}
		pb.finish_with_message("done");
		info!(written, table = %self.table_name, "lancedb write complete");
		Ok(written)
	}

	async fn insert_batch(&self, chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Result<()> {
		let record_batch = to_record_batch(chunks, vectors)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if table_exists(&self.db, &self.table_name).await? {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(())
	}
}

fn to_record_batch(chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Result<RecordBatch> {
	let dim = vectors.first().map_or(0, Vec::len);
	if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
		return Err(anyhow!("embeddings must share one non-zero dimension"));
	}
	let dim = i32::try_from(dim).context("embedding dimension overflows i32")?;
	let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
	let sources: Vec<Option<&str>> = chunks.iter().map(Chunk::source).collect();
	let metas = chunks.iter().map(|c| serde_json::to_string(&c.metadata)).collect::<Result<Vec<_>, _>>()?;
	let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
	Ok(RecordBatch::try_new(build_chunk_schema(dim), vec![
		Arc::new(StringArray::from(contents)),
		Arc::new(StringArray::from(sources)),
		Arc::new(StringArray::from(metas)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
	])?)
}
