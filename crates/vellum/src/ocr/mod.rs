//! OCR integration.
//!
//! The pipeline talks to the recognition engine only through [`OcrBackend`].
//! [`TesseractBackend`] implements it by running the `tesseract` executable and
//! parsing its OSD report and TSV token output.
//!
//! [`OrientationCorrector`] sits on top of the backend and decides whether a
//! page gets rotated before token extraction.
mod backend;
mod error;
mod orientation;
mod osd;
mod tesseract;
mod tsv;
mod validation;

pub use backend::{OcrBackend, TokenRequest};
pub use error::OcrError;
pub use orientation::{Correction, ORIENTATION_CONFIDENCE_THRESHOLD, OrientationCorrector};
pub use osd::parse_osd;
pub use tesseract::{TESSERACT_TIMEOUT_SECONDS, TesseractBackend};
pub use tsv::parse_tsv;
pub use validation::{find_tessdata_dir, validate_language_code, validate_language_data};
