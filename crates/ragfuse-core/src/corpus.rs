//! The ordered, read-only chunk sequence every index is built from.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Chunk, ELISION_MARKER};

#[derive(Debug, Clone)]
pub struct Corpus {
    chunks: Vec<Chunk>,
    positions: HashMap<String, usize>,
}

impl Corpus {
    /// Fails with [`Error::IndexBuild`] when `chunks` is empty.
    pub fn new(chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::IndexBuild("corpus is empty".to_string()));
        }
        let mut positions = HashMap::with_capacity(chunks.len());
        for (i, c) in chunks.iter().enumerate() {
            // first occurrence wins for repeated content
            positions.entry(c.content.clone()).or_insert(i);
        }
        Ok(Self { chunks, positions })
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
    pub fn get(&self, index: usize) -> Option<&Chunk> { self.chunks.get(index) }

    /// Corpus index of the first chunk whose content equals `content`.
    pub fn position_of(&self, content: &str) -> Option<usize> {
        self.positions.get(content).copied()
    }

    /// `window` chunks on each side of `content`, joined with
    /// [`ELISION_MARKER`]. Content that is not part of the corpus is returned
    /// unchanged.
    pub fn expand_neighbors(&self, content: &str, window: usize) -> String {
        let Some(idx) = self.position_of(content) else {
            return content.to_string();
        };
        let start = idx.saturating_sub(window);
        let end = (idx + window + 1).min(self.chunks.len());
        self.chunks[start..end].iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join(ELISION_MARKER)
    }

    /// Distinct `source` values in corpus order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.chunks.iter().filter_map(Chunk::source).filter(|s| seen.insert(*s)).collect()
    }
}
