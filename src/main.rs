//! Terminal chat over a local document collection.
//!
//! Ingests the configured documents on startup, then answers questions in
//! a read-eval loop. Errors are rendered to the user and never terminate
//! the session; previously ingested records survive failed calls.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use docrag::{
    provider_from_env, FsLoader, GenerationProvider, InMemoryVectorStore, OpenAIChatProvider,
    RagConfig, RagError, RagPipeline, RecursiveChunker,
};

#[derive(Parser)]
#[command(name = "docrag", about = "Chat with a local document collection", version)]
struct Cli {
    /// Directory to load documents from. Falls back to DOCS_PATH, then "data".
    #[arg(long)]
    docs: Option<PathBuf>,

    /// Show the retrieved chunks underneath each answer.
    #[arg(long)]
    show_chunks: bool,
}

/// A generation provider used when no endpoint is configured; every call
/// reports an auth failure so the pipeline answers from context instead.
struct UnconfiguredGeneration;

#[async_trait::async_trait]
impl GenerationProvider for UnconfiguredGeneration {
    async fn generate(&self, _prompt: &str) -> docrag::Result<String> {
        Err(RagError::GenerationAuth("no generation endpoint configured".into()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let docs_dir = cli
        .docs
        .or_else(|| std::env::var("DOCS_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"));

    let specific_files: Vec<PathBuf> = std::env::var("SPECIFIC_FILES")
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(PathBuf::from).collect())
        .unwrap_or_default();

    let loader = FsLoader::new(&docs_dir).with_files(specific_files);

    let generation_provider: Arc<dyn GenerationProvider> = match OpenAIChatProvider::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            warn!(error = %e, "generation endpoint not configured, answers will echo context");
            Arc::new(UnconfiguredGeneration)
        }
    };

    let config = RagConfig::from_env()?;
    let pipeline = RagPipeline::builder()
        .embedding_provider(provider_from_env().await)
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .chunker(Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)))
        .generation_provider(generation_provider)
        .config(config)
        .build()?;

    println!("Loading documents from {}...", docs_dir.display());
    match pipeline.ingest(&loader).await {
        Ok(report) => {
            println!(
                "Loaded {} chunks from {} document(s):",
                report.chunk_count,
                report.sources.len()
            );
            for source in &report.sources {
                println!("  - {source}");
            }
        }
        Err(e) => {
            eprintln!("Ingestion failed: {e}");
            eprintln!("You can still type questions, but answers need ingested documents.");
        }
    }

    println!("\nRAG Chat — type 'exit' or 'quit' to stop\n");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("User: ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
                    println!("Exiting chat.");
                    break;
                }
                editor.add_history_entry(question).ok();

                match pipeline.query(question, cli.show_chunks).await {
                    Ok(result) => {
                        println!("\nAssistant: {}", result.answer);
                        println!("(Sources used: {})\n", result.sources_used);
                        for chunk in &result.chunks {
                            println!("  Chunk {} (from {}):", chunk.index, chunk.source);
                            println!("    {}\n", chunk.text);
                        }
                    }
                    Err(e) => eprintln!("Error: {e}\n"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Exiting chat.");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    Ok(())
}
