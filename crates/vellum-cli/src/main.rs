//! Vellum command-line interface.
//!
//! ```bash
//! # every page listed in an index file
//! vellum --batch index.txt --source scans --output archive --language spa
//!
//! # a single page, relative to the source root
//! vellum --file box1/0001.jpg --no-human-readable
//! ```
//!
//! Settings come from `--config`, else from a `vellum.toml` found in the
//! current directory or a parent, else from the defaults; flags override them.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};
use vellum::{BatchRunner, BatchSummary, PageOutcome, PipelineConfig};

#[derive(Parser)]
#[command(name = "vellum")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Enhance, orient and OCR scanned archive pages", long_about = None)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["file", "batch"])))]
struct Cli {
    /// Single page to process, relative to the source root (e.g. box1/0001.jpg)
    #[arg(short = 'f', long)]
    file: Option<String>,

    /// Index file listing one page path per line
    #[arg(short = 'b', long)]
    batch: Option<PathBuf>,

    /// Directory the page paths are resolved against [default: source]
    #[arg(short = 's', long)]
    source: Option<PathBuf>,

    /// Directory the outputs are mirrored into [default: output]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Tesseract language, e.g. eng, spa or spa+lat [default: eng]
    #[arg(short = 'l', long)]
    language: Option<String>,

    /// Word list passed to Tesseract as --user-words
    #[arg(short = 'w', long)]
    words: Option<PathBuf>,

    /// Do not detect and correct page orientation
    #[arg(short = 'r', long)]
    no_rotate: bool,

    /// Do not extract OCR token data (also disables text and keywords)
    #[arg(short = 'd', long)]
    no_data: bool,

    /// Do not write the reconstructed page text
    #[arg(short = 't', long)]
    no_text: bool,

    /// Do not write the keyword list
    #[arg(short = 'k', long)]
    no_keywords: bool,

    /// Archive the OCR rendition instead of the human-readable one
    #[arg(short = 'm', long)]
    no_human_readable: bool,

    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Pages processed at the same time (0 = one per CPU core)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Timeout for a single Tesseract call, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the tesseract executable
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// Log file, appended to on every run
    #[arg(long, default_value = "output.log")]
    log_file: PathBuf,

    /// Only log to stderr
    #[arg(long, conflicts_with = "log_file")]
    no_log_file: bool,

    /// Summary format printed on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = load_config(&cli)?;
    let runner = BatchRunner::with_tesseract(config).context("Invalid configuration")?;

    let cancellation = runner.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing pages in flight");
            cancellation.cancel();
        }
    });

    let summary = match (&cli.file, &cli.batch) {
        (Some(page), _) => {
            let outcome = runner.run_single(page).await;
            BatchSummary::from_outcomes(vec![outcome], false)
        }
        (None, Some(index)) => {
            tracing::info!("Starting a new batch...");
            runner
                .run(index)
                .await
                .with_context(|| format!("Failed to read index {}", index.display()))?
        }
        (None, None) => bail!("either --file or --batch is required"),
    };

    print_summary(&summary, cli.format)?;
    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    let file_layer = if cli.no_log_file {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cli.log_file)
            .with_context(|| format!("Failed to open log file {}", cli.log_file.display()))?;
        Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_filter(env_filter()),
        )
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::discover()?.unwrap_or_default(),
    };

    if let Some(source) = &cli.source {
        config.source_root = source.clone();
    }
    if let Some(output) = &cli.output {
        config.output_root = output.clone();
    }
    if let Some(language) = &cli.language {
        config.ocr.language = language.clone();
    }
    if let Some(words) = &cli.words {
        config.ocr.user_words = Some(words.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.ocr.timeout_secs = timeout;
    }
    if let Some(tesseract) = &cli.tesseract {
        config.ocr.tesseract_path = Some(tesseract.clone());
    }
    if let Some(jobs) = cli.jobs {
        config.max_concurrent_pages = jobs;
    }

    config.stages.rotate &= !cli.no_rotate;
    config.stages.data &= !cli.no_data;
    config.stages.text &= !cli.no_text;
    config.stages.keywords &= !cli.no_keywords;
    config.stages.human_readable &= !cli.no_human_readable;

    Ok(config)
}

fn print_summary(summary: &BatchSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => {
            for outcome in &summary.outcomes {
                match outcome {
                    PageOutcome::Success(report) => {
                        let truncated = report
                            .truncated_at
                            .map(|p| format!(" (text truncated at token {})", p))
                            .unwrap_or_default();
                        println!(
                            "ok        {} [{} files, {} ms]{}",
                            report.page,
                            report.outputs.count(),
                            report.duration_ms,
                            truncated
                        );
                    }
                    PageOutcome::SourceNotFound { page, .. } => println!("missing   {}", page),
                    PageOutcome::Failed { page, reason, .. } => println!("failed    {}: {}", page, reason),
                }
            }
            println!(
                "{} pages: {} processed, {} missing, {} failed{}",
                summary.total(),
                summary.succeeded,
                summary.not_found,
                summary.failed,
                if summary.cancelled { " (cancelled)" } else { "" }
            );
        }
    }
    Ok(())
}
