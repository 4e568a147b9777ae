use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use textbook_miner::config::PipelineConfig;
use textbook_miner::utils::locate_chapter_files;
use textbook_miner::Pipeline;

#[derive(Debug, Parser)]
#[command(author, version, about = "Textbook archive to chapter text CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download, extract, normalize and optionally resolve every configured book
    Run(ConfigArgs),
    /// Only download and unzip the configured books
    Fetch(ConfigArgs),
    /// List the chapter PDFs found in an extraction directory
    Chapters(ChaptersArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Path to configuration JSON file
    #[arg(long)]
    config: PathBuf,
    /// Write chapter texts and summaries here (overrides the config)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ChaptersArgs {
    /// Directory created by unzip, e.g. data/class_9_History
    #[arg(long)]
    dir: PathBuf,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Fetch(args) => fetch_command(args),
        Commands::Chapters(args) => chapters_command(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    info!("Loading configuration from: {:?}", args.config);
    let mut config = PipelineConfig::from_file(&args.config)?;
    if let Some(output) = &args.output {
        config.output_dir = Some(output.clone());
    }
    info!(
        "Configuration loaded: {} books, layout {}",
        config.books.len(),
        config.layout
    );
    Ok(config)
}

fn run_command(args: ConfigArgs) -> Result<()> {
    let config = load_config(&args)?;
    let pipeline = Pipeline::new(config);
    let summary = pipeline.run().context("Pipeline run failed")?;

    for book in &summary.books {
        info!(
            "Book {} ({}): {} chapters",
            book.meta().id,
            book.meta().title,
            book.chapters().len()
        );
    }
    Ok(())
}

fn fetch_command(args: ConfigArgs) -> Result<()> {
    let config = load_config(&args)?;
    let pipeline = Pipeline::new(config);

    for book_config in &pipeline.config().books {
        let book = pipeline
            .fetch_book(book_config)
            .with_context(|| format!("Failed to fetch book {}", book_config.id))?;
        info!(
            "Book {} extracted to {:?}",
            book.meta().id,
            book.extract_dir().unwrap_or_else(|| pipeline.config().extract_to.as_path())
        );
    }
    Ok(())
}

fn chapters_command(args: ChaptersArgs) -> Result<()> {
    let chapters = locate_chapter_files(&args.dir)
        .with_context(|| format!("Failed to scan {:?}", args.dir))?;

    for chapter in chapters {
        println!("{:02}\t{}", chapter.number, chapter.path.display());
    }
    Ok(())
}
