//! ragfuse-llm
//!
//! Text generation against a local Ollama server (`/api/generate`,
//! non-streaming).
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ragfuse_core::config::LlmSettings;
use ragfuse_core::error::LlmError;
use ragfuse_core::traits::LanguageModel;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerateOptions,
    timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaLlm {
    pub fn new(base_url: &str, model: &str, options: GenerateOptions, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options,
            timeout,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let options = GenerateOptions {
            temperature: settings.temperature,
            top_p: settings.top_p,
            num_predict: settings.max_tokens,
        };
        Self::new(&settings.base_url, &settings.model, options, Duration::from_secs(settings.timeout_secs))
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    pub fn model(&self) -> &str { &self.model }

    fn map_send_error(&self, e: &reqwest::Error) -> LlmError {
        if e.is_timeout() { LlmError::Timeout(self.timeout) } else { LlmError::Request(e.to_string()) }
    }
}

impl LanguageModel for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let req = GenerateRequest { model: &self.model, prompt, stream: false, options: self.options };
        debug!(model = %self.model, prompt_len = prompt.len(), "calling ollama generate");

        let resp = self.client.post(&url).json(&req).send().await.map_err(|e| self.map_send_error(&e))?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "generate request failed");
            return Err(LlmError::Status(status.as_u16()));
        }
        let body: GenerateResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() { LlmError::Timeout(self.timeout) } else { LlmError::Decode(e.to_string()) }
        })?;
        if body.response.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(body.response)
    }
}
