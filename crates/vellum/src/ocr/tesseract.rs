//! Tesseract backend driving the `tesseract` executable.

use super::backend::{OcrBackend, TokenRequest};
use super::error::OcrError;
use super::osd::parse_osd;
use super::tsv::parse_tsv;
use super::validation::{find_tessdata_dir, validate_language_code, validate_language_data};
use crate::types::{OcrToken, OrientationEstimate};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Default timeout for a single Tesseract invocation (120 seconds)
pub const TESSERACT_TIMEOUT_SECONDS: u64 = 120;

/// Tesseract OCR through its command-line interface.
///
/// Orientation detection runs `tesseract <image> stdout --psm 0`; token
/// extraction runs `tesseract <image> stdout -l <lang> [--user-words <file>] tsv`.
/// Each call is bounded by a timeout and the child is killed when it expires.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    program: PathBuf,
    timeout: Duration,
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractBackend {
    /// Use `tesseract` from `PATH` with the default timeout.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            timeout: Duration::from_secs(TESSERACT_TIMEOUT_SECONDS),
            tessdata_dir: find_tessdata_dir(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn token_args(image_path: &Path, request: &TokenRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            image_path.into(),
            "stdout".into(),
            "-l".into(),
            request.language.clone().into(),
        ];
        if let Some(words) = &request.user_words {
            args.push("--user-words".into());
            args.push(words.into());
        }
        args.push("tsv".into());
        args
    }

    fn orientation_args(image_path: &Path) -> Vec<OsString> {
        vec![image_path.into(), "stdout".into(), "--psm".into(), "0".into()]
    }

    async fn run(&self, args: &[OsString]) -> Result<String, OcrError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.tessdata_dir {
            command.env("TESSDATA_PREFIX", dir);
        }

        let child = command.spawn().map_err(|source| OcrError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(OcrError::Spawn {
                    program: self.program.display().to_string(),
                    source,
                });
            }
            // The child was moved into wait_with_output and is killed on drop.
            Err(_) => {
                return Err(OcrError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|e| OcrError::InvalidOutput(format!("Tesseract output is not UTF-8: {}", e)))
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn detect_orientation(&self, image_path: &Path) -> Result<OrientationEstimate, OcrError> {
        if !image_path.is_file() {
            return Err(OcrError::InvalidInput(format!(
                "Image for orientation detection not found: {}",
                image_path.display()
            )));
        }

        let report = self.run(&Self::orientation_args(image_path)).await?;
        parse_osd(&report)
    }

    async fn extract_tokens(&self, image_path: &Path, request: &TokenRequest) -> Result<Vec<OcrToken>, OcrError> {
        validate_language_code(&request.language)?;
        if let Some(dir) = &self.tessdata_dir {
            validate_language_data(dir, &request.language)?;
        }
        if let Some(words) = &request.user_words
            && !words.is_file()
        {
            return Err(OcrError::InvalidInput(format!(
                "User words file not found: {}",
                words.display()
            )));
        }
        if !image_path.is_file() {
            return Err(OcrError::InvalidInput(format!(
                "Image for token extraction not found: {}",
                image_path.display()
            )));
        }

        let tsv = self.run(&Self::token_args(image_path, request)).await?;
        let tokens = parse_tsv(&tsv)?;
        tracing::debug!(
            image = %image_path.display(),
            tokens = tokens.len(),
            words = tokens.iter().filter(|t| t.is_word()).count(),
            "tesseract token extraction finished"
        );
        Ok(tokens)
    }
}
