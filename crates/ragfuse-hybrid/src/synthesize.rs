use std::sync::Arc;

use tracing::debug;

use ragfuse_core::error::LlmError;
use ragfuse_core::traits::{LanguageModel, Synthesizer};

/// Fills `{context}` and `{question}` in a prompt template and asks the
/// model for the answer.
pub struct PromptSynthesizer<M> {
    model: Arc<M>,
    template: String,
}

impl<M: LanguageModel> PromptSynthesizer<M> {
    pub fn new(model: Arc<M>, template: impl Into<String>) -> Self {
        Self { model, template: template.into() }
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        fill_template(&self.template, &[("{context}", context), ("{question}", question)])
    }
}

impl<M: LanguageModel> Synthesizer for PromptSynthesizer<M> {
    async fn synthesize(&self, context: &str, question: &str) -> Result<String, LlmError> {
        let prompt = self.render(context, question);
        debug!(context_len = context.len(), prompt_len = prompt.len(), "synthesizing answer");
        self.model.generate(&prompt).await
    }
}

/// Single left-to-right substitution; text inserted for one placeholder is
/// never re-scanned for another.
pub(crate) fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = vars
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, *value)))
            .min_by_key(|(at, _, _)| *at);
        let Some((at, key, value)) = next else { break };
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + key.len()..];
    }
    out.push_str(rest);
    out
}
