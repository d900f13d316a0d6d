//! Shared data types: OCR tokens, orientation estimates and per-page outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pixel rectangle of a recognized element, in source image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGeometry {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl TokenGeometry {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

/// One row of the OCR engine's token stream.
///
/// The stream keeps the engine's structural rows (page, block, paragraph and
/// line rows carry an empty `text`), so the hierarchical numbering reads
/// naturally from zero. Ordering of a stream is the order the engine emitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    pub block_index: usize,
    pub paragraph_index: usize,
    pub line_index: usize,
    /// Engine confidence; structural rows report `-1`.
    pub confidence: f64,
    pub geometry: TokenGeometry,

    /// Tesseract layout level (1 = page, 2 = block, 3 = paragraph, 4 = line, 5 = word).
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub page_index: usize,
    #[serde(default)]
    pub word_index: usize,
}

impl OcrToken {
    /// Build a word-level token with the given hierarchy position.
    pub fn word(text: impl Into<String>, block_index: usize, paragraph_index: usize, line_index: usize) -> Self {
        Self {
            text: text.into(),
            block_index,
            paragraph_index,
            line_index,
            confidence: 0.0,
            geometry: TokenGeometry::default(),
            level: 5,
            page_index: 1,
            word_index: 0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_geometry(mut self, geometry: TokenGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Whether the row is a recognized word (as opposed to a layout row).
    pub fn is_word(&self) -> bool {
        self.level == 5
    }
}

/// Result of the engine's orientation and script detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationEstimate {
    /// Counter-clockwise rotation, in degrees, that brings the page upright.
    pub rotation_degrees: u32,
    /// Confidence exactly as the engine reported it.
    pub confidence: f64,
    pub detected_script: String,
}

/// What the orientation stage decided for a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum OrientationDecision {
    Rotated { degrees: u32, confidence: f64 },
    Upright { confidence: f64 },
    BelowThreshold { degrees: u32, confidence: f64 },
    DetectionFailed { reason: String },
}

impl OrientationDecision {
    pub fn rotated(&self) -> bool {
        matches!(self, Self::Rotated { .. })
    }
}

/// Files written for a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageOutputs {
    pub image: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub text: Option<PathBuf>,
    pub keywords: Option<PathBuf>,
}

impl PageOutputs {
    /// Number of files written.
    pub fn count(&self) -> usize {
        [&self.image, &self.data, &self.text, &self.keywords]
            .iter()
            .filter(|p| p.is_some())
            .count()
    }
}

/// Details of a successfully processed page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub page: String,
    pub outputs: PageOutputs,
    pub orientation: Option<OrientationDecision>,
    pub token_count: Option<usize>,
    /// Position in the token stream where reconstruction stopped on a hierarchy gap.
    pub truncated_at: Option<usize>,
    pub keyword_count: Option<usize>,
    pub duration_ms: u64,
}

/// Outcome of one page in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    Success(PageReport),
    SourceNotFound { page: String, path: PathBuf },
    Failed { page: String, kind: String, reason: String },
}

impl PageOutcome {
    pub fn page(&self) -> &str {
        match self {
            Self::Success(report) => &report.page,
            Self::SourceNotFound { page, .. } => page,
            Self::Failed { page, .. } => page,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_source_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Final tally of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Outcomes in index order. Pages never started because of cancellation are absent.
    pub outcomes: Vec<PageOutcome>,
    pub succeeded: usize,
    pub not_found: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: Vec<PageOutcome>, cancelled: bool) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let not_found = outcomes.iter().filter(|o| o.is_source_not_found()).count();
        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        Self {
            outcomes,
            succeeded,
            not_found,
            failed,
            cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Pages that did not succeed, for any reason.
    pub fn unsuccessful(&self) -> usize {
        self.not_found + self.failed
    }
}
