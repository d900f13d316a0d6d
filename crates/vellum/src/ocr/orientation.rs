//! Confidence-gated orientation correction.

use super::backend::OcrBackend;
use crate::error::{Result, VellumError};
use crate::image::{EnhancedImage, filters, save_image};
use crate::types::OrientationDecision;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Detections at or below this confidence leave the page as it is.
pub const ORIENTATION_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Images after orientation correction, with the decision that produced them.
#[derive(Debug, Clone)]
pub struct Correction {
    pub enhanced: EnhancedImage,
    pub original: Option<DynamicImage>,
    pub decision: OrientationDecision,
}

/// Detects page orientation on the machine rendition and, when the engine is
/// confident enough, turns it and the raw scan by the same angle.
///
/// Detection reads from disk, so the enhanced image is first written to a
/// scratch path the caller chooses. Detection failures never fail the page:
/// the images come back untouched with a [`OrientationDecision::DetectionFailed`].
#[derive(Clone)]
pub struct OrientationCorrector {
    backend: Arc<dyn OcrBackend>,
    threshold: f64,
}

impl OrientationCorrector {
    pub fn new(backend: Arc<dyn OcrBackend>) -> Self {
        Self {
            backend,
            threshold: ORIENTATION_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Run detection and rotate when `confidence > threshold`.
    ///
    /// # Errors
    ///
    /// Only a failure to write the scratch image is returned (as
    /// `Persistence`). Every detection problem is logged and absorbed.
    pub async fn correct(
        &self,
        enhanced: EnhancedImage,
        original: Option<DynamicImage>,
        scratch_path: &Path,
    ) -> Result<Correction> {
        let (enhanced, scratch) = persist_scratch(enhanced, scratch_path.to_path_buf()).await?;

        let estimate = match self.backend.detect_orientation(&scratch).await {
            Ok(estimate) => estimate,
            Err(e) => {
                let err = VellumError::orientation_detection_with_source(
                    format!("{} could not read {}: {}", self.backend.name(), scratch.display(), e),
                    e,
                );
                tracing::warn!(backend = self.backend.name(), error = %err, "continuing without rotation");
                return Ok(Correction {
                    enhanced,
                    original,
                    decision: OrientationDecision::DetectionFailed {
                        reason: err.to_string(),
                    },
                });
            }
        };

        tracing::debug!(
            degrees = estimate.rotation_degrees,
            confidence = estimate.confidence,
            script = %estimate.detected_script,
            "orientation estimate"
        );

        if estimate.confidence.is_nan() || estimate.confidence <= self.threshold {
            tracing::info!(
                degrees = estimate.rotation_degrees,
                confidence = estimate.confidence,
                "orientation confidence too low, not rotating"
            );
            return Ok(Correction {
                enhanced,
                original,
                decision: OrientationDecision::BelowThreshold {
                    degrees: estimate.rotation_degrees,
                    confidence: estimate.confidence,
                },
            });
        }

        if estimate.rotation_degrees == 0 {
            return Ok(Correction {
                enhanced,
                original,
                decision: OrientationDecision::Upright {
                    confidence: estimate.confidence,
                },
            });
        }

        let degrees = estimate.rotation_degrees;
        let (enhanced, original) = tokio::task::spawn_blocking(move || -> Result<_> {
            let enhanced = enhanced.rotated(degrees)?;
            let original = original
                .map(|image| filters::rotate_expand(&image, degrees))
                .transpose()?;
            Ok((enhanced, original))
        })
        .await
        .map_err(|e| VellumError::Other(format!("Rotation task panicked: {}", e)))??;

        tracing::info!(degrees, confidence = estimate.confidence, "page rotated");
        Ok(Correction {
            enhanced,
            original,
            decision: OrientationDecision::Rotated {
                degrees,
                confidence: estimate.confidence,
            },
        })
    }
}

async fn persist_scratch(enhanced: EnhancedImage, path: PathBuf) -> Result<(EnhancedImage, PathBuf)> {
    tokio::task::spawn_blocking(move || -> Result<(EnhancedImage, PathBuf)> {
        save_image(enhanced.image(), &path)?;
        Ok((enhanced, path))
    })
    .await
    .map_err(|e| VellumError::Other(format!("Image write task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::EnhancementProfile;
    use crate::ocr::{OcrError, TokenRequest};
    use crate::types::{OcrToken, OrientationEstimate};
    use async_trait::async_trait;
    use image::{Luma, Rgb, RgbImage};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FixedOrientation {
        result: Mutex<Option<std::result::Result<OrientationEstimate, OcrError>>>,
        seen: Mutex<Option<PathBuf>>,
    }

    impl FixedOrientation {
        fn returning(result: std::result::Result<OrientationEstimate, OcrError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl OcrBackend for FixedOrientation {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn detect_orientation(&self, image_path: &Path) -> std::result::Result<OrientationEstimate, OcrError> {
            assert!(image_path.is_file(), "detection must read a persisted image");
            *self.seen.lock().unwrap() = Some(image_path.to_path_buf());
            self.result.lock().unwrap().take().expect("called once")
        }

        async fn extract_tokens(
            &self,
            _image_path: &Path,
            _request: &TokenRequest,
        ) -> std::result::Result<Vec<OcrToken>, OcrError> {
            Ok(Vec::new())
        }
    }

    fn estimate(degrees: u32, confidence: f64) -> OrientationEstimate {
        OrientationEstimate {
            rotation_degrees: degrees,
            confidence,
            detected_script: "Latin".to_string(),
        }
    }

    fn page() -> (EnhancedImage, DynamicImage) {
        let original = DynamicImage::ImageRgb8(RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 { Rgb([30, 30, 30]) } else { Rgb([230, 220, 200]) }
        }));
        let enhanced = EnhancementProfile::Machine.apply(&original).unwrap();
        (enhanced, original)
    }

    #[tokio::test]
    async fn test_confidence_at_threshold_does_not_rotate() {
        let dir = tempdir().unwrap();
        let (enhanced, original) = page();
        let backend = FixedOrientation::returning(Ok(estimate(90, 0.75)));
        let corrector = OrientationCorrector::new(backend);

        let correction = corrector
            .correct(enhanced, Some(original), &dir.path().join("p.png"))
            .await
            .unwrap();

        assert_eq!(correction.enhanced.image().width(), 40);
        assert_eq!(correction.original.unwrap().width(), 40);
        assert_eq!(
            correction.decision,
            OrientationDecision::BelowThreshold {
                degrees: 90,
                confidence: 0.75
            }
        );
    }

    #[tokio::test]
    async fn test_nan_confidence_does_not_rotate() {
        let dir = tempdir().unwrap();
        let (enhanced, original) = page();
        let backend = FixedOrientation::returning(Ok(estimate(90, f64::NAN)));
        let corrector = OrientationCorrector::new(backend);

        let correction = corrector
            .correct(enhanced, Some(original), &dir.path().join("p.png"))
            .await
            .unwrap();

        assert!(matches!(correction.decision, OrientationDecision::BelowThreshold { degrees: 90, .. }));
        assert_eq!(correction.enhanced.image().width(), 40);
        assert_eq!(correction.original.unwrap().width(), 40);
    }

    #[tokio::test]
    async fn test_confidence_above_threshold_rotates_both() {
        let dir = tempdir().unwrap();
        let (enhanced, original) = page();
        let backend = FixedOrientation::returning(Ok(estimate(90, 0.751)));
        let corrector = OrientationCorrector::new(backend);

        let correction = corrector
            .correct(enhanced, Some(original), &dir.path().join("p.png"))
            .await
            .unwrap();

        assert!(correction.decision.rotated());
        let enhanced = correction.enhanced.image();
        assert_eq!((enhanced.width(), enhanced.height()), (20, 40));
        let original = correction.original.unwrap();
        assert_eq!((original.width(), original.height()), (20, 40));
        // Counter-clockwise: the dark left half ends up at the bottom.
        assert_eq!(original.to_rgb8().get_pixel(0, 39), &Rgb([30, 30, 30]));
        assert_eq!(original.to_rgb8().get_pixel(0, 0), &Rgb([230, 220, 200]));
    }

    #[tokio::test]
    async fn test_detection_failure_returns_inputs_unchanged() {
        let dir = tempdir().unwrap();
        let (enhanced, original) = page();
        let enhanced_bytes = enhanced.image().as_bytes().to_vec();
        let original_bytes = original.as_bytes().to_vec();
        let backend = FixedOrientation::returning(Err(OcrError::Timeout { seconds: 1 }));
        let corrector = OrientationCorrector::new(backend);

        let correction = corrector
            .correct(enhanced, Some(original), &dir.path().join("p.png"))
            .await
            .unwrap();

        assert!(matches!(correction.decision, OrientationDecision::DetectionFailed { .. }));
        assert_eq!(correction.enhanced.image().as_bytes(), enhanced_bytes.as_slice());
        assert_eq!(correction.original.unwrap().as_bytes(), original_bytes.as_slice());
    }

    #[tokio::test]
    async fn test_confident_upright_is_noop() {
        let dir = tempdir().unwrap();
        let (enhanced, _) = page();
        let backend = FixedOrientation::returning(Ok(estimate(0, 12.0)));
        let corrector = OrientationCorrector::new(backend.clone());
        let scratch = dir.path().join("nested-ok.png");

        let correction = corrector.correct(enhanced, None, &scratch).await.unwrap();
        assert_eq!(correction.decision, OrientationDecision::Upright { confidence: 12.0 });
        assert!(correction.original.is_none());
        assert_eq!(backend.seen.lock().unwrap().as_deref(), Some(scratch.as_path()));
    }

    #[tokio::test]
    async fn test_scratch_write_failure_is_persistence_error() {
        let dir = tempdir().unwrap();
        let enhanced = EnhancementProfile::Machine
            .apply(&DynamicImage::ImageLuma8(image::GrayImage::from_pixel(4, 4, Luma([128]))))
            .unwrap();
        let backend = FixedOrientation::returning(Ok(estimate(0, 1.0)));
        let corrector = OrientationCorrector::new(backend);

        let err = corrector
            .correct(enhanced, None, &dir.path().join("missing-dir").join("p.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, VellumError::Persistence { .. }));
    }
}
