//! Arrow layout of the chunk table.
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const CONTENT_COL: &str = "content";
pub const SOURCE_COL: &str = "source";
/// Full chunk metadata, JSON-encoded.
pub const METADATA_COL: &str = "metadata";
pub const VECTOR_COL: &str = "vector";

pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(CONTENT_COL, DataType::Utf8, false),
		Field::new(SOURCE_COL, DataType::Utf8, true),
		Field::new(METADATA_COL, DataType::Utf8, false),
		Field::new(VECTOR_COL, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
