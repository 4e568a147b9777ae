use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use textbook_miner::utils::pdf_parser::DEFAULT_LINE_MARGIN;
use textbook_miner::utils::{
    extract_text_from_pdf, normalize_text, FileSink, LayoutParams, PdfExtractEngine,
    RuleSegmenter, TextSink,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert a single PDF into plain text")]
struct Args {
    /// PDF file to convert
    #[arg(short, long)]
    input: PathBuf,

    /// Write the text here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Paragraph-break sensitivity passed to the PDF engine
    #[arg(long, default_value_t = DEFAULT_LINE_MARGIN)]
    line_margin: f32,

    /// Reflow paragraphs and put one sentence per line
    #[arg(long, default_value = "false")]
    normalize: bool,

    /// With --normalize, keep whole paragraphs on one line
    #[arg(long, default_value = "false")]
    no_sentence_split: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.line_margin.is_finite() && args.line_margin > 0.0,
        "--line-margin must be a positive number"
    );

    let params = LayoutParams {
        line_margin: args.line_margin,
    };
    let content = extract_text_from_pdf(&args.input, &PdfExtractEngine, &params)
        .with_context(|| format!("Failed to convert {:?}", args.input))?;

    let text = if args.normalize {
        normalize_text(&content.text, &RuleSegmenter::english(), args.no_sentence_split)?
    } else {
        content.text
    };

    match &args.output {
        Some(path) => {
            let mut sink = FileSink::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            sink.write_text(&text)?;
            sink.close()?;
            info!("Wrote {} pages to {:?}", content.pages.len(), path);
        }
        None => println!("{}", text),
    }

    Ok(())
}
