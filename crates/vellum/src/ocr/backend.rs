//! OCR backend trait.

use super::error::OcrError;
use crate::types::{OcrToken, OrientationEstimate};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Parameters for a token extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Tesseract language spec, e.g. `spa` or `spa+lat`.
    pub language: String,
    /// Optional user word list handed to the engine.
    pub user_words: Option<PathBuf>,
}

impl TokenRequest {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            user_words: None,
        }
    }

    pub fn with_user_words(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_words = Some(path.into());
        self
    }
}

/// The OCR engine as seen by the pipeline.
///
/// Both operations read the image from disk: orientation detection in
/// particular only works on file-backed input, so callers persist the image
/// before asking.
///
/// # Thread Safety
///
/// Backends are shared across concurrently processed pages and must be
/// `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use std::path::Path;
/// use vellum::ocr::{OcrBackend, OcrError, TokenRequest};
/// use vellum::types::{OcrToken, OrientationEstimate};
///
/// struct FixedBackend;
///
/// #[async_trait]
/// impl OcrBackend for FixedBackend {
///     fn name(&self) -> &str { "fixed" }
///
///     async fn detect_orientation(&self, _image: &Path) -> Result<OrientationEstimate, OcrError> {
///         Ok(OrientationEstimate { rotation_degrees: 0, confidence: 5.0, detected_script: "Latin".into() })
///     }
///
///     async fn extract_tokens(&self, _image: &Path, _request: &TokenRequest) -> Result<Vec<OcrToken>, OcrError> {
///         Ok(vec![OcrToken::word("Hola", 0, 0, 0)])
///     }
/// }
/// ```
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Backend name, used in logs.
    fn name(&self) -> &str;

    /// Estimate how far the page is turned and which script it uses.
    async fn detect_orientation(&self, image_path: &Path) -> Result<OrientationEstimate, OcrError>;

    /// Recognize the page and return the token stream in engine order.
    async fn extract_tokens(&self, image_path: &Path, request: &TokenRequest) -> Result<Vec<OcrToken>, OcrError>;
}
