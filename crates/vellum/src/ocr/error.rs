use thiserror::Error;

/// Errors raised by OCR backends.
///
/// These stay local to the OCR layer; `From<OcrError> for VellumError` maps
/// them onto the page-level taxonomy.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("OCR engine exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    #[error("Invalid OCR engine output: {0}")]
    InvalidOutput(String),

    #[error("Invalid language code: {0}")]
    InvalidLanguageCode(String),

    #[error("Missing language data: {0}")]
    MissingLanguageData(String),

    #[error("Invalid image input: {0}")]
    InvalidInput(String),
}
