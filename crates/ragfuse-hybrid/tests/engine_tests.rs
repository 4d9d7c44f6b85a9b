use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;

use ragfuse_core::config::Settings;
use ragfuse_core::corpus::Corpus;
use ragfuse_core::error::{Error, LlmError, RetrievalError};
use ragfuse_core::traits::{LanguageModel, Retriever, VectorRetriever};
use ragfuse_core::types::{Chunk, QueryOptions, SourceKind, CONTEXT_SEPARATOR, UNKNOWN_SOURCE};
use ragfuse_hybrid::{ContextAssembler, HybridRetriever, QueryDecomposer, RagEngine};
use ragfuse_lexical::LexicalIndex;

const BREAK_RULES: &str = "Break rules: 5 minutes per hour.";
const PREGNANT: &str = "Pregnant workers get extra breaks.";
const NOT_COMBINED: &str = "Breaks cannot be combined.";
const QUESTION: &str = "Can break time be combined for pregnant workers?";

fn corpus_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(BREAK_RULES).with_source("rules.md"),
        Chunk::new(PREGNANT).with_source("rules.md"),
        Chunk::new(NOT_COMBINED).with_source("faq.md"),
    ]
}

/// Vector stand-in that always answers with the same list.
struct FixedVector(Vec<Chunk>);

impl VectorRetriever for FixedVector {
    async fn search(&self, _query: &str, k: usize, _fetch_k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        Ok(self.0.iter().take(k).cloned().collect())
    }
}

struct DownVector;

impl VectorRetriever for DownVector {
    async fn search(&self, _query: &str, _k: usize, _fetch_k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        Err(RetrievalError::unavailable(SourceKind::Vector, "connection refused"))
    }
}

/// Answers by query text; unknown queries get nothing.
struct ByQuery(Vec<(&'static str, Vec<Chunk>)>);

impl Retriever for ByQuery {
    async fn retrieve(&self, query: &str, _k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        Ok(self.0.iter().find(|(q, _)| *q == query).map(|(_, c)| c.clone()).unwrap_or_default())
    }
}

struct Slow;

impl Retriever for Slow {
    async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Chunk>, RetrievalError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec![Chunk::new("late")])
    }
}

/// Replies to decomposition prompts with `decomposition` and to everything
/// else with `answer`, recording every prompt it sees.
struct ScriptedLlm {
    decomposition: Result<String, LlmError>,
    answer: Result<String, LlmError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(decomposition: Result<&str, LlmError>, answer: Result<&str, LlmError>) -> Arc<Self> {
        Arc::new(Self {
            decomposition: decomposition.map(str::to_string),
            answer: answer.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }
}

impl LanguageModel for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().expect("lock").push(prompt.to_string());
        if prompt.contains("SUBQUERIES:") { self.decomposition.clone() } else { self.answer.clone() }
    }
}

fn engine<V: VectorRetriever>(vector: V, llm: Arc<ScriptedLlm>) -> RagEngine<V, ScriptedLlm> {
    RagEngine::new(corpus_chunks(), vector, llm, &Settings::default()).expect("engine")
}

fn no_decompose() -> QueryOptions {
    QueryOptions { decompose: false, ..QueryOptions::default() }
}

#[tokio::test]
async fn lexical_signal_recovers_what_the_vector_side_misses() {
    let llm = ScriptedLlm::new(Err(LlmError::EmptyResponse), Ok("No, breaks cannot be combined."));
    let engine = engine(FixedVector(vec![Chunk::new(BREAK_RULES).with_source("rules.md")]), Arc::clone(&llm));

    let answer = engine.ask(QUESTION, &no_decompose()).await.expect("answer");
    let contents: Vec<&str> = answer.chunks.iter().map(|c| c.content.as_str()).collect();
    assert!(contents.contains(&PREGNANT));
    assert!(contents.contains(&NOT_COMBINED));
    assert_eq!(answer.num_chunks, answer.chunks.len());
    assert_eq!(answer.subqueries, vec![QUESTION.to_string()]);
    assert_eq!(answer.answer, "No, breaks cannot be combined.");
    assert_eq!(answer.sources, vec!["rules.md".to_string(), "faq.md".to_string()]);

    // the synthesis prompt carries the original question and the joined context
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(QUESTION));
    assert!(prompts[0].contains(&contents.join(CONTEXT_SEPARATOR)));
}

#[tokio::test]
async fn decomposed_subqueries_drive_retrieval_but_not_synthesis() {
    let llm = ScriptedLlm::new(
        Ok(r#"{"subqueries": ["Are breaks combined?", "What do pregnant workers get?"]}"#),
        Ok("answer"),
    );
    let engine = engine(FixedVector(vec![]), Arc::clone(&llm));
    let answer = engine.ask(QUESTION, &QueryOptions::default()).await.expect("answer");
    assert_eq!(answer.subqueries, vec!["Are breaks combined?", "What do pregnant workers get?"]);
    let contents: Vec<&str> = answer.chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents[0], NOT_COMBINED, "first sub-query's best hit leads");
    assert!(contents.contains(&PREGNANT));

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(QUESTION));
    assert!(!prompts[1].contains("What do pregnant workers get?"));
}

#[tokio::test]
async fn empty_question_is_rejected_before_any_model_call() {
    let llm = ScriptedLlm::new(Ok(r#"{"subqueries": ["x"]}"#), Ok("answer"));
    let engine = engine(FixedVector(vec![]), Arc::clone(&llm));
    assert!(matches!(engine.ask("   \n", &QueryOptions::default()).await, Err(Error::EmptyQuestion)));
    assert!(matches!(engine.retrieve("", &QueryOptions::default()).await, Err(Error::EmptyQuestion)));
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn synthesis_failure_is_surfaced() {
    let llm = ScriptedLlm::new(Err(LlmError::EmptyResponse), Err(LlmError::Status(503)));
    let engine = engine(FixedVector(vec![]), llm);
    match engine.ask(QUESTION, &no_decompose()).await {
        Err(Error::Synthesis(LlmError::Status(503))) => {}
        other => panic!("expected synthesis error, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_vector_source_degrades_to_lexical_only() {
    let llm = ScriptedLlm::new(Err(LlmError::EmptyResponse), Ok("answer"));
    let engine = engine(DownVector, llm);
    let context = engine.retrieve("combined pregnant", &no_decompose()).await.expect("context");
    let contents: Vec<&str> = context.chunks().iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec![NOT_COMBINED, PREGNANT]);
}

#[tokio::test]
async fn expanded_context_includes_neighbors() {
    let llm = ScriptedLlm::new(Err(LlmError::EmptyResponse), Ok("answer"));
    let engine = engine(FixedVector(vec![]), Arc::clone(&llm));
    let opts = QueryOptions { decompose: false, expand_neighbors: 1, k_per_query: 1, ..QueryOptions::default() };
    engine.ask("combined", &opts).await.expect("answer");
    let prompt = &llm.prompts()[0];
    assert!(prompt.contains(&format!("{PREGNANT}\n[...]\n{NOT_COMBINED}")));
}

#[tokio::test]
async fn stats_describe_the_corpus() {
    let engine = engine(FixedVector(vec![]), ScriptedLlm::new(Ok("{}"), Ok("answer")));
    let stats = engine.stats();
    assert_eq!(stats.total_chunks, 3);
    assert_eq!(stats.unique_sources, 2);
}

#[test]
fn empty_corpus_fails_index_build() {
    let llm = ScriptedLlm::new(Ok("{}"), Ok("answer"));
    let result = RagEngine::new(vec![], FixedVector(vec![]), llm, &Settings::default());
    assert!(matches!(result, Err(Error::IndexBuild(_))));
}

#[tokio::test]
async fn decomposition_falls_back_to_the_question() {
    for reply in [Err(LlmError::Request("down".into())), Ok("not json"), Ok(r#"{"subqueries": []}"#)] {
        let llm = ScriptedLlm::new(reply, Ok("unused"));
        let decomposer = QueryDecomposer::new(llm, ragfuse_core::config::DEFAULT_DECOMPOSE_PROMPT, 4);
        assert_eq!(decomposer.decompose(QUESTION).await, vec![QUESTION.to_string()]);
    }
}

#[tokio::test]
async fn repeated_content_across_subqueries_is_kept_once() {
    let shared = Chunk::new("shared passage").with_source("a.md");
    let lexical = ByQuery(vec![
        ("A", vec![Chunk::new("only a"), shared.clone()]),
        ("B", vec![shared.clone(), Chunk::new("only b").with_source("b.md")]),
    ]);
    let hybrid = HybridRetriever::new(ByQuery(vec![]), lexical);
    let corpus = Arc::new(Corpus::new(vec![shared.clone()]).expect("corpus"));
    let assembler = ContextAssembler::new(corpus);

    let subqueries = vec!["A".to_string(), "B".to_string()];
    let context = assembler.assemble(&hybrid, &subqueries, &QueryOptions::default()).await;
    let contents: Vec<&str> = context.chunks().iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["only a", "shared passage", "only b"]);
    assert_eq!(context.sources(), &[UNKNOWN_SOURCE.to_string(), "a.md".to_string(), "b.md".to_string()]);
}

#[tokio::test]
async fn slow_source_times_out_without_sinking_the_other() {
    let corpus = Arc::new(Corpus::new(corpus_chunks()).expect("corpus"));
    let hybrid = HybridRetriever::new(Slow, LexicalIndex::build(corpus));
    let results = hybrid.retrieve_sources("pregnant", 4, Duration::from_millis(50)).await;
    assert!(matches!(results.vector, Err(RetrievalError::Timeout { kind: SourceKind::Vector, .. })));
    assert_eq!(results.lexical.expect("lexical").len(), 1);

    let opts = QueryOptions { retrieval_timeout: Duration::from_millis(50), ..QueryOptions::default() };
    let fused = hybrid.retrieve("pregnant", &opts).await;
    assert_eq!(fused[0].chunk.content, PREGNANT);
}
