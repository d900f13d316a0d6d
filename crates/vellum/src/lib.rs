//! Vellum - archival scan processing
//!
//! Vellum turns scanned archive pages into an OCR-ready rendition, a
//! rendition for human readers, the OCR token data, the page text and a
//! keyword list, mirroring the source directory layout into an output tree.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vellum::{BatchRunner, PipelineConfig, run_batch_sync};
//!
//! # fn main() -> vellum::Result<()> {
//! let config = PipelineConfig {
//!     ocr: vellum::OcrConfig {
//!         language: "spa".to_string(),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let runner = BatchRunner::with_tesseract(config)?;
//! let summary = run_batch_sync(&runner, "index.txt")?;
//! println!("{} succeeded, {} missing, {} failed", summary.succeeded, summary.not_found, summary.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Image** (`image`): pixel filters and the machine/human enhancement profiles
//! - **OCR** (`ocr`): backend trait, Tesseract subprocess backend, orientation correction
//! - **Text** (`text`): block/paragraph/line reconstruction from the token stream
//! - **Keywords** (`keywords`): normalized, deduplicated keyword lists
//! - **Pipeline** (`pipeline`): per-page processing and the batch runner
//! - **Core** (`core`): configuration loading

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod image;
pub mod keywords;
pub mod ocr;
pub mod pipeline;
pub mod text;
pub mod types;

pub use error::{Result, VellumError};
pub use types::*;

pub use core::config::{OcrConfig, PipelineConfig, StageConfig};
pub use pipeline::{BatchRunner, CancellationFlag, PageProcessor, process_page_sync, run_batch_sync, run_paths_sync};
