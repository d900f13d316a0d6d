use super::page::PageProcessor;
use crate::core::config::PipelineConfig;
use crate::error::Result;
use crate::ocr::OcrBackend;
use crate::types::{BatchSummary, PageOutcome};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shared flag that stops a batch from starting further pages.
///
/// Pages already in flight finish normally and keep their outputs.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parse an index file: one page path per line, blank lines skipped,
/// surrounding whitespace trimmed.
pub fn parse_index(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse an index file. Unreadable or non UTF-8 files are an error.
pub async fn read_index(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_index(&content))
}

/// Processes an index of pages with per-page failure isolation.
///
/// Pages are started in index order with at most
/// [`PipelineConfig::concurrency`] in flight; with the default of one page
/// at a time the run is strictly sequential. Outcomes are returned in index
/// order regardless of completion order.
///
/// # Example
///
/// ```rust,no_run
/// use vellum::core::config::PipelineConfig;
/// use vellum::pipeline::BatchRunner;
///
/// # async fn example() -> vellum::Result<()> {
/// let runner = BatchRunner::with_tesseract(PipelineConfig::default())?;
/// let summary = runner.run(std::path::Path::new("index.txt")).await?;
/// println!("{} of {} pages processed", summary.succeeded, summary.total());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BatchRunner {
    processor: Arc<PageProcessor>,
    concurrency: usize,
    cancellation: CancellationFlag,
}

impl BatchRunner {
    /// Validate `config` and build a runner around `backend`.
    pub fn new(config: PipelineConfig, backend: Arc<dyn OcrBackend>) -> Result<Self> {
        config.validate()?;
        let concurrency = config.concurrency();
        Ok(Self::from_processor(PageProcessor::new(config, backend), concurrency))
    }

    /// Validate `config` and build a runner backed by the `tesseract` executable.
    pub fn with_tesseract(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let concurrency = config.concurrency();
        Ok(Self::from_processor(PageProcessor::with_tesseract(config), concurrency))
    }

    fn from_processor(processor: PageProcessor, concurrency: usize) -> Self {
        Self {
            processor: Arc::new(processor),
            concurrency: concurrency.max(1),
            cancellation: CancellationFlag::new(),
        }
    }

    /// Use an externally owned cancellation flag, e.g. one set by a signal handler.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    pub fn processor(&self) -> &PageProcessor {
        &self.processor
    }

    /// Process every page listed in the index file.
    ///
    /// # Errors
    ///
    /// Only a failure to read the index fails the run; page failures are
    /// reported in the summary.
    pub async fn run(&self, index_path: &Path) -> Result<BatchSummary> {
        let pages = read_index(index_path).await?;
        tracing::info!(index = %index_path.display(), pages = pages.len(), "starting batch");
        Ok(self.run_paths(pages).await)
    }

    /// Process one page outside of any index.
    pub async fn run_single(&self, page: &str) -> PageOutcome {
        tracing::info!("Image 1: {}", page);
        self.processor.process(page).await
    }

    /// Process an in-memory list of pages.
    pub async fn run_paths(&self, pages: Vec<String>) -> BatchSummary {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut cancelled = false;
        let mut scheduled = 0;

        for (index, page) in pages.iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            if self.cancellation.is_cancelled() {
                tracing::warn!(remaining = pages.len() - index, "batch cancelled, not starting further pages");
                cancelled = true;
                break;
            }

            tracing::info!("Image {}: {}", index + 1, page);
            let processor = Arc::clone(&self.processor);
            let page = page.clone();
            tasks.spawn(async move {
                let outcome = processor.process(&page).await;
                drop(permit);
                (index, outcome)
            });
            scheduled += 1;
        }

        let mut outcomes: Vec<Option<PageOutcome>> = vec![None; scheduled];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "page task did not complete"),
            }
        }

        let outcomes: Vec<PageOutcome> = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.unwrap_or_else(|| PageOutcome::Failed {
                    page: pages[index].clone(),
                    kind: "other".to_string(),
                    reason: "Page task panicked".to_string(),
                })
            })
            .collect();

        let summary = BatchSummary::from_outcomes(outcomes, cancelled);
        tracing::info!(
            total = summary.total(),
            succeeded = summary.succeeded,
            not_found = summary.not_found,
            failed = summary.failed,
            cancelled = summary.cancelled,
            duration_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );
        summary
    }
}
