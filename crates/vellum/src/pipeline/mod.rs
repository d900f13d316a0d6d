//! Page and batch orchestration.
//!
//! [`PageProcessor`] runs the stages for one page; [`BatchRunner`] feeds it
//! the pages of an index and collects a [`BatchSummary`]. Both are async; the
//! `*_sync` functions drive them on a process-wide Tokio runtime for callers
//! without one.
//!
//! # Example
//!
//! ```rust,no_run
//! use vellum::core::config::PipelineConfig;
//! use vellum::pipeline::{BatchRunner, run_batch_sync};
//!
//! # fn main() -> vellum::Result<()> {
//! let runner = BatchRunner::with_tesseract(PipelineConfig::default())?;
//! let summary = run_batch_sync(&runner, "index.txt")?;
//! for outcome in &summary.outcomes {
//!     println!("{}: success={}", outcome.page(), outcome.is_success());
//! }
//! # Ok(())
//! # }
//! ```
mod batch;
mod layout;
mod page;

pub use batch::{BatchRunner, CancellationFlag, parse_index, read_index};
pub use layout::PageLayout;
pub use page::PageProcessor;

use crate::Result;
use crate::types::{BatchSummary, PageOutcome};
use once_cell::sync::Lazy;
use std::path::Path;

/// Global Tokio runtime for synchronous operations.
///
/// Creating a runtime per call is expensive; the runtime is built once on
/// first use and shared. Building it can only fail when the process is out
/// of resources, in which case nothing else would work either, so it panics.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Synchronous wrapper for [`BatchRunner::run`].
pub fn run_batch_sync(runner: &BatchRunner, index_path: impl AsRef<Path>) -> Result<BatchSummary> {
    GLOBAL_RUNTIME.block_on(runner.run(index_path.as_ref()))
}

/// Synchronous wrapper for [`BatchRunner::run_paths`].
pub fn run_paths_sync(runner: &BatchRunner, pages: Vec<String>) -> BatchSummary {
    GLOBAL_RUNTIME.block_on(runner.run_paths(pages))
}

/// Synchronous wrapper for [`PageProcessor::process`].
pub fn process_page_sync(processor: &PageProcessor, page: &str) -> PageOutcome {
    GLOBAL_RUNTIME.block_on(processor.process(page))
}
