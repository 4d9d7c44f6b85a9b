//! Typed configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (nested keys separated by `__`, e.g.
//! `APP_LLM__MODEL=mistral`). `RUST_ENV` selects the environment file.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{FusionWeights, QueryOptions};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub prompts: PromptSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub docs_dir: String,
    pub lancedb_dir: String,
    pub table_name: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            docs_dir: "docs".to_string(),
            lancedb_dir: "data/lancedb".to_string(),
            table_name: "chunks".to_string(),
            chunk_size: 700,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k: usize,
    pub source_k: usize,
    pub fetch_k: usize,
    pub weights: FusionWeights,
    pub decompose: bool,
    pub max_subqueries: usize,
    pub expand_neighbors: usize,
    pub timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: 8,
            source_k: 8,
            fetch_k: 16,
            weights: FusionWeights::default(),
            decompose: true,
            max_subqueries: 4,
            expand_neighbors: 0,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// `ollama` or `fake` (deterministic hashing, no model needed).
    pub provider: String,
    pub model: String,
    pub dim: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { provider: "ollama".to_string(), model: "nomic-embed-text".to_string(), dim: 768, batch_size: 32 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Must contain `{question}`.
    pub decompose: String,
    /// Must contain `{context}` and `{question}`.
    pub synthesize: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            decompose: DEFAULT_DECOMPOSE_PROMPT.to_string(),
            synthesize: DEFAULT_SYNTHESIZE_PROMPT.to_string(),
        }
    }
}

pub const DEFAULT_DECOMPOSE_PROMPT: &str = r#"You split complex questions into simpler ones.

User question: "{question}"

Split this question into 2-4 simpler, concrete sub-questions that together answer the original question.
Each sub-question must be self-contained and answerable from the document text.

Reply with JSON only:
{"subqueries": ["sub-question 1", "sub-question 2", ...]}

SUBQUERIES:"#;

pub const DEFAULT_SYNTHESIZE_PROMPT: &str = r#"You answer ONLY from the provided context.

RULES:
1) Use only information from the context; if something is missing, say: "I could not find this information in the available documents."
2) Answer in the same language as the question.
3) Quote key numbers, names and terms exactly as they appear in the text.
4) If the context contains conflicting information, point it out.
5) Be concise.
6) Finish with a short list of sources (file names from the metadata) when available.
CONTEXT:
{context}

QUESTION:
{question}

ANSWER:"#;

impl Settings {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(&figment)
    }

    /// Extract and validate settings from an already-assembled figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let settings: Settings = figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.k == 0 || r.source_k == 0 {
            return Err(Error::InvalidConfig("retrieval.k and retrieval.source_k must be positive".to_string()));
        }
        if r.fetch_k < r.source_k {
            return Err(Error::InvalidConfig(format!("retrieval.fetch_k ({}) must be >= retrieval.source_k ({})", r.fetch_k, r.source_k)));
        }
        if r.max_subqueries == 0 {
            return Err(Error::InvalidConfig("retrieval.max_subqueries must be positive".to_string()));
        }
        if self.data.chunk_overlap >= self.data.chunk_size {
            return Err(Error::InvalidConfig("data.chunk_overlap must be smaller than data.chunk_size".to_string()));
        }
        if !self.prompts.decompose.contains("{question}") {
            return Err(Error::InvalidConfig("prompts.decompose must contain {question}".to_string()));
        }
        if !self.prompts.synthesize.contains("{context}") || !self.prompts.synthesize.contains("{question}") {
            return Err(Error::InvalidConfig("prompts.synthesize must contain {context} and {question}".to_string()));
        }
        Ok(())
    }

    /// Default per-call options derived from the `[retrieval]` section.
    pub fn query_options(&self) -> QueryOptions {
        let r = &self.retrieval;
        QueryOptions {
            k_per_query: r.k,
            source_k: r.source_k,
            fetch_k: r.fetch_k,
            weights: r.weights,
            decompose: r.decompose,
            expand_neighbors: r.expand_neighbors,
            retrieval_timeout: Duration::from_secs(r.timeout_secs),
        }
    }

    pub fn docs_dir(&self) -> PathBuf { expand_path(&self.data.docs_dir) }
    pub fn lancedb_dir(&self) -> PathBuf { expand_path(&self.data.lancedb_dir) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
