//! ragfuse-embed
//!
//! Text embedders used by the vector retriever and the LanceDB writer.
//! `OllamaEmbedder` calls a local Ollama server; `FakeEmbedder` hashes tokens
//! into a fixed-size vector and is used in tests and offline development
//! (`APP_USE_FAKE_EMBEDDINGS=1`).
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ragfuse_core::config::{EmbeddingSettings, LlmSettings};
use ragfuse_core::traits::Embedder;

pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    id: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build().context("building embedding http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            id: format!("ollama:{model}"),
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(vec![]); }
        let url = format!("{}/api/embed", self.base_url);
        debug!(model = %self.model, n = texts.len(), "embedding batch");
        let resp = self
            .client
            .post(&url)
            .json(&EmbedRequest { model: &self.model, input: texts })
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("embedding request failed: status={status}"));
        }
        let body: EmbedResponse = resp.json().await.context("decoding embedding response")?;
        if body.embeddings.len() != texts.len() {
            return Err(anyhow!("expected {} embeddings, got {}", texts.len(), body.embeddings.len()));
        }
        Ok(body.embeddings)
    }
}

/// Deterministic bag-of-tokens embedder; L2-normalized.
#[derive(Debug, Clone)]
pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1), id: format!("fake:d{}", dim.max(1)) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() { continue; }
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            #[allow(clippy::cast_possible_truncation)]
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Runtime-selected embedder.
pub enum AnyEmbedder {
    Ollama(OllamaEmbedder),
    Fake(FakeEmbedder),
}

impl Embedder for AnyEmbedder {
    fn embedder_id(&self) -> &str {
        match self {
            Self::Ollama(e) => e.embedder_id(),
            Self::Fake(e) => e.embedder_id(),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Ollama(e) => e.embed_batch(texts).await,
            Self::Fake(e) => e.embed_batch(texts).await,
        }
    }
}

/// Picks the embedder from settings; `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// fake one regardless of the configured provider.
pub fn get_default_embedder(embedding: &EmbeddingSettings, llm: &LlmSettings) -> Result<AnyEmbedder> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if use_fake || embedding.provider == "fake" {
        info!(dim = embedding.dim, "using fake embedder");
        return Ok(AnyEmbedder::Fake(FakeEmbedder::new(embedding.dim)));
    }
    match embedding.provider.as_str() {
        "ollama" => {
            info!(model = %embedding.model, "using ollama embedder");
            let timeout = Duration::from_secs(llm.timeout_secs);
            Ok(AnyEmbedder::Ollama(OllamaEmbedder::new(&llm.base_url, &embedding.model, timeout)?))
        }
        other => Err(anyhow!("unknown embedding provider '{other}'")),
    }
}
