//! docqa-ask: answer a question against a local document
//!
//! 1. Extracts text from the PDF or text file
//! 2. Detects the document language and picks a QA model
//! 3. Chunks the text and resolves the best answer across chunks

use anyhow::Context;
use clap::Parser;
use docqa_common::{
    config::AppConfig,
    context::{ChunkedQaResolver, ResolverOptions},
    language::{build_qa_router, LanguageDetector, ScriptDetector},
    VERSION,
};
use docqa_ingestion::extract_file;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docqa-ask", version, about = "Ask a question about a PDF or text document")]
struct Cli {
    /// Document to read (.pdf, .txt, .md).
    file: PathBuf,

    /// Question to answer.
    question: String,

    /// Words per chunk (overrides configuration).
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Words shared by consecutive chunks (overrides configuration).
    #[arg(long)]
    stride: Option<usize>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Log filter, e.g. "debug" or "docqa_common=trace".
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct AskOutput<'a> {
    file: String,
    question: &'a str,
    language: String,
    model: &'a str,
    answer: Option<&'a str>,
    score: f32,
    chunk_index: Option<usize>,
    chunk_count: usize,
    failed_chunks: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("docqa-ask v{}", VERSION);

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(max_tokens) = cli.max_tokens {
        config.chunking.max_tokens = max_tokens;
    }
    if let Some(stride) = cli.stride {
        config.chunking.stride = stride;
    }
    config.validate()?;

    let text = extract_file(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let detector = ScriptDetector::default();
    let language = detector.detect(&text);

    let router = build_qa_router(&config.inference)?;
    let resolver = ChunkedQaResolver::new(
        router.route(&language).clone(),
        ResolverOptions::from(&config.resolver),
    );

    info!(
        language = %language,
        model = resolver.model_name(),
        words = text.split_whitespace().count(),
        "Resolving question"
    );

    let resolution = resolver
        .answer_document(&cli.question, &text, &config.chunking)
        .await?;

    if cli.json {
        let output = AskOutput {
            file: cli.file.display().to_string(),
            question: &cli.question,
            language: language.to_string(),
            model: resolver.model_name(),
            answer: resolution.answer(),
            score: resolution.score,
            chunk_index: resolution.best.as_ref().map(|b| b.chunk_index),
            chunk_count: resolution.chunks_total,
            failed_chunks: resolution.chunks_failed,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match &resolution.best {
        Some(best) => println!(
            "Answer: {}\nScore: {:.4} (chunk {} of {}, language {})",
            best.text, best.score, best.chunk_index + 1, resolution.chunks_total, language
        ),
        None => println!("No answer found"),
    }

    if resolution.chunks_failed > 0 {
        eprintln!(
            "warning: {} of {} chunks could not be queried",
            resolution.chunks_failed, resolution.chunks_total
        );
    }

    Ok(())
}
