use std::sync::Arc;

use tracing::info;

use ragfuse_core::config::Settings;
use ragfuse_core::corpus::Corpus;
use ragfuse_core::error::{Error, Result};
use ragfuse_core::traits::{Diversified, LanguageModel, Synthesizer, VectorRetriever};
use ragfuse_core::types::{Answer, AssembledContext, Chunk, EngineStats, QueryOptions};
use ragfuse_lexical::LexicalIndex;

use crate::assemble::ContextAssembler;
use crate::decompose::QueryDecomposer;
use crate::retriever::HybridRetriever;
use crate::synthesize::PromptSynthesizer;

pub const RETRIEVAL_MODE: &str = "hybrid (vector + bm25)";

/// Question answering over one corpus: decompose, retrieve with both
/// signals, assemble a deduplicated context and synthesize.
///
/// Immutable after construction; `ask` takes `&self` so one engine can be
/// shared behind an `Arc`.
pub struct RagEngine<V, M> {
    corpus: Arc<Corpus>,
    lexical: LexicalIndex,
    vector: V,
    decomposer: QueryDecomposer<M>,
    synthesizer: PromptSynthesizer<M>,
    assembler: ContextAssembler,
}

impl<V: VectorRetriever, M: LanguageModel> RagEngine<V, M> {
    /// Builds the lexical index over `chunks`. The vector retriever must be
    /// backed by the same chunks.
    pub fn new(chunks: Vec<Chunk>, vector: V, model: Arc<M>, settings: &Settings) -> Result<Self> {
        let corpus = Arc::new(Corpus::new(chunks)?);
        let lexical = LexicalIndex::build(Arc::clone(&corpus));
        let decomposer = QueryDecomposer::new(
            Arc::clone(&model),
            settings.prompts.decompose.clone(),
            settings.retrieval.max_subqueries,
        );
        let synthesizer = PromptSynthesizer::new(model, settings.prompts.synthesize.clone());
        let assembler = ContextAssembler::new(Arc::clone(&corpus));
        info!(chunks = corpus.len(), sources = corpus.sources().len(), "engine ready");
        Ok(Self { corpus, lexical, vector, decomposer, synthesizer, assembler })
    }

    pub async fn ask(&self, question: &str, opts: &QueryOptions) -> Result<Answer> {
        let (subqueries, context) = self.gather(question, opts).await?;
        let context_text = self.assembler.context_text(&context, opts.expand_neighbors);
        let answer = self.synthesizer.synthesize(&context_text, question).await.map_err(Error::Synthesis)?;
        info!(chunks = context.len(), sources = context.sources().len(), "answer ready");
        let (chunks, sources) = context.into_parts();
        Ok(Answer { answer, sources, num_chunks: chunks.len(), chunks, subqueries })
    }

    /// Everything `ask` does short of synthesis.
    pub async fn retrieve(&self, question: &str, opts: &QueryOptions) -> Result<AssembledContext> {
        Ok(self.gather(question, opts).await?.1)
    }

    pub async fn subqueries(&self, question: &str, opts: &QueryOptions) -> Result<Vec<String>> {
        let question = validate_question(question)?;
        if opts.decompose {
            Ok(self.decomposer.decompose(question).await)
        } else {
            Ok(vec![question.to_string()])
        }
    }

    async fn gather(&self, question: &str, opts: &QueryOptions) -> Result<(Vec<String>, AssembledContext)> {
        let subqueries = self.subqueries(question, opts).await?;
        info!(question = question.trim(), subqueries = subqueries.len(), "retrieving");
        let hybrid = HybridRetriever::new(Diversified::new(&self.vector, opts.fetch_k), &self.lexical);
        let context = self.assembler.assemble(&hybrid, &subqueries, opts).await;
        Ok((subqueries, context))
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_chunks: self.corpus.len(),
            unique_sources: self.corpus.sources().len(),
            retrieval_mode: RETRIEVAL_MODE,
        }
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }
}

fn validate_question(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() { Err(Error::EmptyQuestion) } else { Ok(trimmed) }
}
