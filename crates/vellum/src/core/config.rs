//! Configuration loading and management.
//!
//! A run is described by a [`PipelineConfig`]: where pages come from, where
//! outputs go, how the OCR engine is called and which stages run. It can be
//! built in code, loaded from TOML or JSON, or discovered as `vellum.toml` in
//! the working directory or one of its parents.

use crate::ocr::{TESSERACT_TIMEOUT_SECONDS, TokenRequest, validate_language_code};
use crate::{Result, VellumError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`PipelineConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "vellum.toml";

/// Main pipeline configuration.
///
/// # Example
///
/// ```rust
/// use vellum::core::config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.ocr.language, "eng");
/// assert!(config.stages.rotate);
///
/// // let config = PipelineConfig::from_toml_file("vellum.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root the index paths are resolved against
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Root of the mirrored output tree
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub stages: StageConfig,

    /// Pages processed at the same time. `1` runs the batch sequentially,
    /// `0` uses one slot per CPU core.
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,
}

/// OCR engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language spec (e.g. "eng", "spa+lat")
    #[serde(default = "default_language")]
    pub language: String,

    /// Word list passed to the engine as `--user-words`
    #[serde(default)]
    pub user_words: Option<PathBuf>,

    /// Upper bound for a single engine call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path to the `tesseract` executable (None = look it up on PATH)
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
}

/// Stage toggles. Text and keyword extraction only run when data extraction runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default = "default_true")]
    pub rotate: bool,

    #[serde(default = "default_true")]
    pub data: bool,

    #[serde(default = "default_true")]
    pub text: bool,

    #[serde(default = "default_true")]
    pub keywords: bool,

    /// Archive the human-legible rendition instead of the OCR one
    #[serde(default = "default_true")]
    pub human_readable: bool,
}

fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_source_root() -> PathBuf {
    PathBuf::from("source")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_timeout_secs() -> u64 {
    TESSERACT_TIMEOUT_SECONDS
}

fn default_max_concurrent_pages() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
            ocr: OcrConfig::default(),
            stages: StageConfig::default(),
            max_concurrent_pages: default_max_concurrent_pages(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            user_words: None,
            timeout_secs: default_timeout_secs(),
            tesseract_path: None,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            rotate: true,
            data: true,
            text: true,
            keywords: true,
            human_readable: true,
        }
    }
}

impl StageConfig {
    pub fn text_enabled(&self) -> bool {
        self.data && self.text
    }

    pub fn keywords_enabled(&self) -> bool {
        self.data && self.keywords
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn token_request(&self) -> TokenRequest {
        TokenRequest {
            language: self.language.clone(),
            user_words: self.user_words.clone(),
        }
    }
}

impl PipelineConfig {
    /// Number of pages that may be in flight at once.
    pub fn concurrency(&self) -> usize {
        match self.max_concurrent_pages {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    /// Check the settings a run depends on before any page is touched.
    pub fn validate(&self) -> Result<()> {
        validate_language_code(&self.ocr.language)
            .map_err(|e| VellumError::validation_with_source(format!("Invalid OCR language '{}'", self.ocr.language), e))?;

        if self.ocr.timeout_secs == 0 {
            return Err(VellumError::validation("OCR timeout must be at least one second"));
        }

        if let Some(words) = &self.ocr.user_words
            && !words.is_file()
        {
            return Err(VellumError::validation(format!(
                "User words file not found: {}",
                words.display()
            )));
        }

        if self.writes_into_source() {
            tracing::warn!(
                source_root = %self.source_root.display(),
                output_root = %self.output_root.display(),
                "output root is the source root, source images will be overwritten"
            );
        }

        if !self.source_root.is_dir() {
            tracing::warn!(
                source_root = %self.source_root.display(),
                "source root does not exist, every page will be reported missing"
            );
        }

        Ok(())
    }

    /// Whether outputs land in the source tree, so archived images replace the scans.
    pub fn writes_into_source(&self) -> bool {
        match (self.source_root.canonicalize(), self.output_root.canonicalize()) {
            (Ok(source), Ok(output)) => source == output,
            _ => normalized(&self.source_root) == normalized(&self.output_root),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VellumError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| VellumError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VellumError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| VellumError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load by extension: `.json` as JSON, anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `vellum.toml` in the current directory and its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(VellumError::Io)?;
        Self::discover_from(&current)
    }

    /// Same as [`discover`](Self::discover), starting at `start`.
    pub fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = Some(start);

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using discovered config");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
            current = dir.parent();
        }

        Ok(None)
    }
}
