//! Error types for Vellum.
//!
//! Every fallible operation in the library returns [`VellumError`]. The variants
//! follow the page-processing taxonomy: each one names the stage that failed so
//! that the batch runner can turn it into a per-page outcome.
//!
//! - `SourceNotFound` - the page does not exist under the source root (page skipped)
//! - `Enhancement` - an image filter step could not be applied (page aborted)
//! - `OrientationDetection` - orientation detection failed (recovered, page proceeds unrotated)
//! - `MalformedTokenStream` - the token hierarchy was violated (recovered by truncation)
//! - `Extraction` - the OCR token extraction call failed (page aborted)
//! - `Persistence` - a directory or output file could not be written (page aborted)
//!
//! `Io` errors from configuration and index loading bubble up unchanged; inside a
//! page they are wrapped as `Persistence` with the offending path in the message.
//!
//! # Example
//!
//! ```rust
//! use vellum::{Result, VellumError};
//!
//! fn read_index(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!     if content.trim().is_empty() {
//!         return Err(VellumError::validation(format!("Index is empty: {}", path)));
//!     }
//!     Ok(content)
//! }
//! ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `VellumError`.
pub type Result<T> = std::result::Result<T, VellumError>;

/// Main error type for all Vellum operations.
#[derive(Debug, Error)]
pub enum VellumError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Enhancement error: {message}")]
    Enhancement {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Orientation detection error: {message}")]
    OrientationDetection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Malformed token stream at token {position}: {message}")]
    MalformedTokenStream { position: usize, message: String },

    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for VellumError {
    fn from(err: serde_json::Error) -> Self {
        VellumError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::ocr::OcrError> for VellumError {
    fn from(err: crate::ocr::OcrError) -> Self {
        VellumError::Extraction {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl VellumError {
    error_constructor!(enhancement, Enhancement);
    error_constructor!(orientation_detection, OrientationDetection);
    error_constructor!(extraction, Extraction);
    error_constructor!(persistence, Persistence);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Short, stable name of the error kind, used in run logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::SourceNotFound { .. } => "source_not_found",
            Self::Enhancement { .. } => "enhancement",
            Self::OrientationDetection { .. } => "orientation_detection",
            Self::MalformedTokenStream { .. } => "malformed_token_stream",
            Self::Extraction { .. } => "extraction",
            Self::Persistence { .. } => "persistence",
            Self::Validation { .. } => "validation",
            Self::Serialization { .. } => "serialization",
            Self::Other(_) => "other",
        }
    }
}
