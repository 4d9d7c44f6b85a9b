use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use ragfuse_core::chunker::{ChunkingConfig, DocumentChunker};
use ragfuse_core::config::Settings;
use ragfuse_core::types::{Answer, QueryOptions};
use ragfuse_embed::{get_default_embedder, AnyEmbedder};
use ragfuse_hybrid::RagEngine;
use ragfuse_llm::OllamaLlm;
use ragfuse_vector::{load_corpus, open_db, LanceDbWriter, LanceVectorRetriever};

type Engine = RagEngine<LanceVectorRetriever<AnyEmbedder>, OllamaLlm>;

const USAGE: &str = "Usage: ragfuse <command> [args...]

Commands:
  index [docs_dir]                                  chunk, embed and store documents
  ask \"<question>\" [--no-decompose] [--k N] [--expand W]
  stats                                             corpus statistics
  repl                                              interactive questions";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let settings = Settings::load().context("loading configuration")?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "index" => index(&settings, args.first().map(PathBuf::from)).await,
        "ask" => {
            let (question, opts) = parse_ask(&args, settings.query_options())?;
            let engine = build_engine(&settings).await?;
            let answer = engine.ask(&question, &opts).await?;
            print_answer(&answer);
            Ok(())
        }
        "stats" => {
            let engine = build_engine(&settings).await?;
            print_stats(&engine);
            Ok(())
        }
        "repl" => repl(&settings).await,
        "help" | "-h" | "--help" => { println!("{USAGE}"); Ok(()) }
        other => { eprintln!("Unknown command: {other}\n\n{USAGE}"); std::process::exit(1); }
    }
}

async fn index(settings: &Settings, docs_dir: Option<PathBuf>) -> Result<()> {
    let docs_dir = docs_dir.unwrap_or_else(|| settings.docs_dir());
    let chunker = DocumentChunker::new(ChunkingConfig {
        chunk_size: settings.data.chunk_size,
        chunk_overlap: settings.data.chunk_overlap,
    });
    let chunks = chunker.process_directory(&docs_dir)?;
    if chunks.is_empty() { bail!("no .txt or .md documents found in {}", docs_dir.display()); }

    let embedder = get_default_embedder(&settings.embedding, &settings.llm)?;
    let writer = LanceDbWriter::new(&settings.lancedb_dir(), &settings.data.table_name).await?;
    writer.reset().await?;
    let written = writer.write(&chunks, &embedder, settings.embedding.batch_size).await?;
    println!("Indexed {written} chunks from {} into {}", docs_dir.display(), settings.lancedb_dir().display());
    Ok(())
}

async fn build_engine(settings: &Settings) -> Result<Engine> {
    let db_path = settings.lancedb_dir();
    let conn = open_db(db_path.to_string_lossy().as_ref()).await?;
    let chunks = load_corpus(&conn, &settings.data.table_name).await?;
    let embedder = get_default_embedder(&settings.embedding, &settings.llm)?;
    let vector = LanceVectorRetriever::new(&db_path, &settings.data.table_name, embedder).await?;
    let llm = OllamaLlm::from_settings(&settings.llm)?;
    info!(model = %settings.llm.model, base_url = llm.base_url(), "language model configured");
    Ok(RagEngine::new(chunks, vector, Arc::new(llm), settings)?)
}

fn parse_ask(args: &[String], mut opts: QueryOptions) -> Result<(String, QueryOptions)> {
    let mut question: Option<String> = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--no-decompose" => opts.decompose = false,
            "--k" => opts.k_per_query = flag_value(&mut it, "--k")?,
            "--expand" => opts.expand_neighbors = flag_value(&mut it, "--expand")?,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            text if question.is_none() => question = Some(text.to_string()),
            extra => bail!("unexpected argument {extra}; quote the question"),
        }
    }
    let question = question.ok_or_else(|| anyhow!("Usage: ragfuse ask \"<question>\" [--no-decompose] [--k N] [--expand W]"))?;
    if opts.k_per_query == 0 { bail!("--k must be positive"); }
    Ok((question, opts))
}

fn flag_value<'a>(it: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<usize> {
    let raw = it.next().ok_or_else(|| anyhow!("{flag} needs a value"))?;
    raw.parse().with_context(|| format!("{flag} expects a number, got '{raw}'"))
}

fn print_answer(answer: &Answer) {
    if answer.subqueries.len() > 1 {
        println!("Sub-questions:");
        for (i, q) in answer.subqueries.iter().enumerate() { println!("  {}. {q}", i + 1); }
        println!();
    }
    println!("{}\n", answer.answer.trim());
    println!("Sources ({} chunks):", answer.num_chunks);
    for s in &answer.sources { println!("  - {s}"); }
}

fn print_stats(engine: &Engine) {
    let stats = engine.stats();
    println!("Chunks:          {}", stats.total_chunks);
    println!("Unique sources:  {}", stats.unique_sources);
    println!("Retrieval mode:  {}", stats.retrieval_mode);
}

async fn repl(settings: &Settings) -> Result<()> {
    let engine = build_engine(settings).await?;
    let opts = settings.query_options();
    println!("Ask a question (help, stats, exit).");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        match line.trim() {
            "" => continue,
            "exit" | "quit" | "q" => break,
            "stats" => print_stats(&engine),
            "help" => println!("Type a question, or: stats, help, exit | quit | q"),
            question => match engine.ask(question, &opts).await {
                Ok(answer) => print_answer(&answer),
                Err(e) => eprintln!("error: {e}"),
            },
        }
    }
    Ok(())
}
