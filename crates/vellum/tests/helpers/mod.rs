//! Shared fixtures for the integration tests: a scriptable OCR backend and
//! scan images written to a temporary source tree.
#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use vellum::core::config::PipelineConfig;
use vellum::ocr::{OcrBackend, OcrError, TokenRequest};
use vellum::types::{OcrToken, OrientationEstimate, TokenGeometry};
use vellum::CancellationFlag;

/// Orientation behaviour of the mock backend.
#[derive(Clone)]
pub enum Orientation {
    Estimate { degrees: u32, confidence: f64 },
    Fail,
}

/// Backend returning canned results and recording how it was called.
pub struct MockBackend {
    pub orientation: Orientation,
    pub tokens: Vec<OcrToken>,
    pub fail_extraction: bool,
    /// Set on the first extraction call, to cancel a running batch.
    pub cancel_on_extract: Option<CancellationFlag>,
    pub detect_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
    pub languages: Mutex<Vec<String>>,
    pub extracted_images: Mutex<Vec<PathBuf>>,
}

impl MockBackend {
    pub fn new(tokens: Vec<OcrToken>) -> Self {
        Self {
            orientation: Orientation::Estimate {
                degrees: 0,
                confidence: 10.0,
            },
            tokens,
            fail_extraction: false,
            cancel_on_extract: None,
            detect_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
            extracted_images: Mutex::new(Vec::new()),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn failing_extraction(mut self) -> Self {
        self.fail_extraction = true;
        self
    }

    pub fn cancelling(mut self, flag: CancellationFlag) -> Self {
        self.cancel_on_extract = Some(flag);
        self
    }
}

#[async_trait]
impl OcrBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn detect_orientation(&self, image_path: &Path) -> Result<OrientationEstimate, OcrError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        assert!(image_path.is_file(), "orientation detection needs a file on disk");

        match &self.orientation {
            Orientation::Estimate { degrees, confidence } => Ok(OrientationEstimate {
                rotation_degrees: *degrees,
                confidence: *confidence,
                detected_script: "Latin".to_string(),
            }),
            Orientation::Fail => Err(OcrError::EngineFailed {
                status: "exit status: 1".to_string(),
                stderr: "Too few characters. Skipping this page".to_string(),
            }),
        }
    }

    async fn extract_tokens(&self, image_path: &Path, request: &TokenRequest) -> Result<Vec<OcrToken>, OcrError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(request.language.clone());
        self.extracted_images.lock().unwrap().push(image_path.to_path_buf());

        if let Some(flag) = &self.cancel_on_extract {
            flag.cancel();
        }
        if self.fail_extraction {
            return Err(OcrError::Timeout { seconds: 120 });
        }
        Ok(self.tokens.clone())
    }
}

pub fn layout_token(level: u32, block: usize, paragraph: usize, line: usize) -> OcrToken {
    OcrToken {
        text: String::new(),
        block_index: block,
        paragraph_index: paragraph,
        line_index: line,
        confidence: -1.0,
        geometry: TokenGeometry::new(0, 0, 600, 400),
        level,
        page_index: 1,
        word_index: 0,
    }
}

/// Token stream shaped like Tesseract TSV output for a two-line page.
pub fn sample_tokens() -> Vec<OcrToken> {
    let word = |text: &str, line: usize, n: usize, left: u32| {
        let mut token = OcrToken::word(text, 1, 1, line)
            .with_confidence(90.0 + n as f64)
            .with_geometry(TokenGeometry::new(left, 40 * line as u32, 50, 30));
        token.word_index = n;
        token
    };

    vec![
        layout_token(1, 0, 0, 0),
        layout_token(2, 1, 0, 0),
        layout_token(3, 1, 1, 0),
        layout_token(4, 1, 1, 1),
        word("Año", 1, 1, 10),
        word("1914,", 1, 2, 70),
        word("lote", 1, 3, 130),
        word("#12-A", 1, 4, 190),
        layout_token(4, 1, 1, 2),
        word("Expediente", 2, 1, 10),
    ]
}

pub const SAMPLE_TEXT: &str = "Año 1914, lote #12-A\nExpediente";
pub const SAMPLE_WORDS: &str = "1914\nao\nexpediente\nlote\n";

/// A colored scan with a dark band on the left, `width` x `height` pixels.
pub fn scan_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if x < width / 3 {
            Rgb([40, 35, 30])
        } else if (x + y) % 7 == 0 {
            Rgb([120, 90, 60])
        } else {
            Rgb([225, 210, 170])
        }
    }))
}

/// Write a scan under `source_root/relative`, creating directories.
pub fn write_scan(source_root: &Path, relative: &str, width: u32, height: u32) -> PathBuf {
    let path = source_root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    scan_image(width, height).save(&path).unwrap();
    path
}

/// Configuration rooted in a scratch directory.
pub fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        source_root: dir.join("source"),
        output_root: dir.join("output"),
        ..Default::default()
    }
}
