use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use ragfuse_core::error::DecompositionError;
use ragfuse_core::traits::LanguageModel;

use crate::synthesize::fill_template;

#[derive(Debug, Deserialize)]
struct SubqueryList {
    subqueries: Vec<String>,
}

/// Splits a question into simpler sub-questions with one model call.
///
/// [`QueryDecomposer::decompose`] never fails: any problem yields the
/// original question as the only sub-query.
pub struct QueryDecomposer<M> {
    model: Arc<M>,
    template: String,
    max_subqueries: usize,
}

impl<M: LanguageModel> QueryDecomposer<M> {
    pub fn new(model: Arc<M>, template: impl Into<String>, max_subqueries: usize) -> Self {
        Self { model, template: template.into(), max_subqueries: max_subqueries.max(1) }
    }

    pub async fn try_decompose(&self, question: &str) -> Result<Vec<String>, DecompositionError> {
        let prompt = fill_template(&self.template, &[("{question}", question)]);
        let raw = self.model.generate(&prompt).await?;
        parse_subqueries(&raw, self.max_subqueries)
    }

    pub async fn decompose(&self, question: &str) -> Vec<String> {
        match self.try_decompose(question).await {
            Ok(subqueries) => {
                debug!(count = subqueries.len(), ?subqueries, "question decomposed");
                subqueries
            }
            Err(e) => {
                warn!(error = %e, "decomposition unavailable, using the original question");
                vec![question.to_string()]
            }
        }
    }
}

/// Parses `{"subqueries": [...]}`, tolerating a surrounding Markdown code
/// fence. Blank entries are dropped and the list is capped at `max`.
pub fn parse_subqueries(raw: &str, max: usize) -> Result<Vec<String>, DecompositionError> {
    let parsed: SubqueryList = serde_json::from_str(strip_code_fence(raw))?;
    let subqueries: Vec<String> = parsed
        .subqueries
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(max)
        .collect();
    if subqueries.is_empty() {
        return Err(DecompositionError::Empty);
    }
    Ok(subqueries)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else { return trimmed };
    // drop the info string (e.g. "json") on the opening fence line
    let inner = inner.split_once('\n').map_or("", |(_, body)| body);
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}
