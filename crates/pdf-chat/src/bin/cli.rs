//! Command-line interface for pdf-chat
//!
//! Run with: cargo run -p pdf-chat --bin pdf-chat -- --help

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_chat::ingestion::IngestPipeline;
use pdf_chat::providers::{EmbedderFactory, HttpEmbedderFactory};
use pdf_chat::types::Source;
use pdf_chat::{Answer, IngestReport, Language, RagConfig, RagService, Session, UploadedFile};

#[derive(Parser, Debug)]
#[command(name = "pdf-chat", version, about = "Chat with your PDFs", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults to $PDF_CHAT_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process PDFs into the vector store, replacing its previous contents
    Ingest {
        /// Document language (english, persian)
        #[arg(short, long)]
        language: Language,
        /// PDF files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask one question about the processed documents
    Ask {
        /// Document language (english, persian)
        #[arg(short, long)]
        language: Language,
        /// The question
        question: String,
    },
    /// Interactive chat; processes the given PDFs first when any are passed
    Chat {
        /// Document language (english, persian)
        #[arg(short, long)]
        language: Language,
        /// PDF files to process before chatting
        files: Vec<PathBuf>,
    },
    /// List supported languages and their embedding models
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_chat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest { language, files } => ingest(config, language, &files).await,
        Commands::Ask { language, question } => ask(config, language, &question).await,
        Commands::Chat { language, files } => chat(config, language, &files).await,
        Commands::Languages => {
            languages(&config);
            Ok(())
        }
    }
}

/// Ingestion only needs the embedding service, not the generation credential
async fn ingest(config: RagConfig, language: Language, files: &[PathBuf]) -> anyhow::Result<()> {
    let uploads = read_uploads(files).await?;
    let profile = config.languages.get(language)?;
    let embedder = HttpEmbedderFactory::new(&config.embeddings)?.embedder_for(profile)?;
    let pipeline = IngestPipeline::from_config(&config)?;

    let spinner = spinner("Processing documents... This may take a moment.")?;
    let result = pipeline.ingest(&uploads, language, embedder.as_ref()).await;
    spinner.finish_and_clear();

    print_report(&result?);
    Ok(())
}

async fn ask(config: RagConfig, language: Language, question: &str) -> anyhow::Result<()> {
    let service = RagService::from_config(config)?;
    let pipeline = service.answer_pipeline(language).await?;

    let spinner = spinner("Thinking...")?;
    let result = pipeline.invoke(question).await;
    spinner.finish_and_clear();

    print_answer(&result?);
    Ok(())
}

async fn chat(config: RagConfig, language: Language, files: &[PathBuf]) -> anyhow::Result<()> {
    let service = RagService::from_config(config)?;
    let mut session = Session::new();
    session.select_language(language);

    if files.is_empty() {
        session
            .resume(&service)
            .await
            .map_err(|e| anyhow::anyhow!("{}. Pass PDF files to process them first.", e))?;
    } else {
        let uploads = read_uploads(files).await?;
        let spinner = spinner("Processing documents... This may take a moment.")?;
        let result = session.process_documents(&service, &uploads).await;
        spinner.finish_and_clear();
        print_report(&result?);
    }

    println!(
        "{} Ask a question about the documents ({} to quit)",
        style("›").cyan().bold(),
        style("/quit").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "/quit" || question == "/exit" {
            break;
        }

        let spinner = spinner("Thinking...")?;
        let result = session.ask(question).await;
        spinner.finish_and_clear();

        match result {
            Ok(answer) => print_answer(&answer),
            Err(e) if e.is_retryable() => {
                eprintln!("{} {} (try again)", style("!").yellow().bold(), e)
            }
            Err(e) => eprintln!("{} {}", style("✗").red().bold(), e),
        }
    }

    Ok(())
}

fn languages(config: &RagConfig) {
    for language in config.languages.languages() {
        if let Ok(profile) = config.languages.get(language) {
            println!(
                "{:<10} {:<10} {}",
                style(language.display_name()).bold(),
                language.as_tag(),
                style(&profile.embedding_model).dim()
            );
        }
    }
}

async fn read_uploads(files: &[PathBuf]) -> anyhow::Result<Vec<UploadedFile>> {
    let mut uploads = Vec::with_capacity(files.len());
    for path in files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        uploads.push(UploadedFile::new(display_name(path), data));
    }
    Ok(uploads)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn print_report(report: &IngestReport) {
    println!(
        "{} Processed {} document(s) successfully! {} pages, {} chunks ({}, {} dims) in {:.1}s",
        style("✓").green().bold(),
        report.files,
        report.pages,
        report.chunks,
        report.embedding_model,
        report.dimensions,
        report.processing_time_ms as f64 / 1000.0
    );
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!("{}", style("Sources:").dim());
        for (i, source) in answer.sources.iter().enumerate() {
            print_source(i + 1, source);
        }
    }
}

fn print_source(index: usize, source: &Source) {
    println!(
        "  {} {}, page {} {}",
        style(format!("[{}]", index)).dim(),
        source.filename,
        source.page_number,
        style(format!("(score {:.3})", source.score)).dim()
    );
}
