//! LanceDB connection helpers and row decoding shared by the search and
//! corpus-loading paths.
use anyhow::{anyhow, Context, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection};
use tracing::{debug, info};

use ragfuse_core::types::{Chunk, Meta};

use crate::schema::{CONTENT_COL, METADATA_COL, VECTOR_COL};

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.with_context(|| format!("opening lancedb at {uri}"))
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Every stored chunk in table order. Chunks written by
/// [`crate::writer::LanceDbWriter`] come back in the order they were written.
pub async fn load_corpus(conn: &Connection, table: &str) -> Result<Vec<Chunk>> {
    if !table_exists(conn, table).await? {
        return Err(anyhow!("table '{table}' not found; run the indexer first"));
    }
    let t = conn.open_table(table).execute().await?;
    let mut stream = t
        .query()
        .select(Select::columns(&[CONTENT_COL, METADATA_COL]))
        .execute()
        .await?;
    let mut chunks = Vec::new();
    while let Some(batch) = stream.try_next().await? {
        chunks.extend(chunks_from_batch(&batch)?);
    }
    info!(table, chunks = chunks.len(), "loaded corpus from lancedb");
    Ok(chunks)
}

pub(crate) fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not utf8"))
}

pub(crate) fn chunks_from_batch(batch: &RecordBatch) -> Result<Vec<Chunk>> {
    let contents = string_column(batch, CONTENT_COL)?;
    let metas = string_column(batch, METADATA_COL)?;
    (0..batch.num_rows())
        .map(|i| {
            let metadata: Meta = if metas.is_null(i) {
                Meta::new()
            } else {
                serde_json::from_str(metas.value(i)).with_context(|| format!("decoding metadata of row {i}"))?
            };
            Ok(Chunk { content: contents.value(i).to_string(), metadata })
        })
        .collect()
}

pub(crate) fn vectors_from_batch(batch: &RecordBatch) -> Result<Vec<Vec<f32>>> {
    let col = batch
        .column_by_name(VECTOR_COL)
        .ok_or_else(|| anyhow!("column '{VECTOR_COL}' missing"))?;
    let list = col
        .as_fixed_size_list_opt()
        .ok_or_else(|| anyhow!("column '{VECTOR_COL}' is not a fixed size list"))?;
    let vectors = (0..list.len())
        .map(|i| {
            list.value(i)
                .as_primitive_opt::<Float32Type>()
                .map(|p| p.values().to_vec())
                .ok_or_else(|| anyhow!("vector row {i} is not float32"))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(rows = vectors.len(), "decoded vectors");
    Ok(vectors)
}
