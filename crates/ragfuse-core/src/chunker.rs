//! Splits a directory of text documents into corpus chunks.
//!
//! Paragraphs (blank-line separated) are packed greedily up to `chunk_size`
//! characters. A paragraph longer than that is cut on word boundaries into
//! windows that overlap by roughly `chunk_overlap` characters.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::types::Chunk;

const EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { chunk_size: 700, chunk_overlap: 200 } }
}

#[derive(Debug, Default)]
pub struct DocumentChunker {
    config: ChunkingConfig,
}

impl DocumentChunker {
    pub fn new(config: ChunkingConfig) -> Self { Self { config } }

    /// Chunks every supported file under `docs_dir`, in sorted path order.
    pub fn process_directory(&self, docs_dir: &Path) -> Result<Vec<Chunk>> {
        let files = list_documents(docs_dir);
        if files.is_empty() {
            info!(dir = %docs_dir.display(), "no documents found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, path) in files.iter().enumerate() {
            debug!("processing file {}/{}: {}", file_index + 1, files.len(), path.display());
            let content = read_file_content(path)?;
            all_chunks.extend(self.chunk_document(&content, &path.to_string_lossy()));
        }
        info!("processed {} files into {} chunks", files.len(), all_chunks.len());
        Ok(all_chunks)
    }

    /// Chunks one document. Every chunk carries `source` and `chunk_index`.
    pub fn chunk_document(&self, content: &str, source: &str) -> Vec<Chunk> {
        let max = self.config.chunk_size;
        let mut pieces: Vec<String> = Vec::new();
        let mut current = String::new();
        for paragraph in content.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            if char_len(paragraph) > max {
                if !current.is_empty() { pieces.push(std::mem::take(&mut current)); }
                pieces.extend(self.split_with_overlap(paragraph));
                continue;
            }
            let joined_len = if current.is_empty() { char_len(paragraph) } else { char_len(&current) + 2 + char_len(paragraph) };
            if joined_len > max && !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            if !current.is_empty() { current.push_str("\n\n"); }
            current.push_str(paragraph);
        }
        if !current.is_empty() { pieces.push(current); }

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(text).with_source(source).with_meta("chunk_index", i.to_string()))
            .collect()
    }

    fn split_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let mut end = start;
            let mut len = 0usize;
            while end < words.len() {
                let add = char_len(words[end]) + usize::from(end > start);
                if len + add > self.config.chunk_size && end > start { break; }
                len += add;
                end += 1;
            }
            chunks.push(words[start..end].join(" "));
            if end >= words.len() { break; }
            // walk back from `end` until the overlap budget is spent
            let mut next = end;
            let mut overlap = 0usize;
            while next > start + 1 {
                let w = char_len(words[next - 1]) + 1;
                if overlap + w > self.config.chunk_overlap { break; }
                overlap += w;
                next -= 1;
            }
            start = next;
        }
        chunks
    }
}

fn char_len(s: &str) -> usize { s.chars().count() }

fn read_file_content(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

fn list_documents(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()).is_some_and(|ext| EXTENSIONS.contains(&ext)))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
