//! Enhancement profiles: fixed, named pipelines of filter steps.

use super::filters;
use crate::error::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One filter step with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum FilterStep {
    GaussianBlur { radius: f32 },
    UnsharpMask { radius: f32, percent: i32, threshold: i32 },
    AutoContrast { cutoff_low: f32, cutoff_high: f32 },
    Grayscale,
    Desaturate { factor: f32 },
}

impl FilterStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GaussianBlur { .. } => "gaussian_blur",
            Self::UnsharpMask { .. } => "unsharp_mask",
            Self::AutoContrast { .. } => "autocontrast",
            Self::Grayscale => "grayscale",
            Self::Desaturate { .. } => "desaturate",
        }
    }

    pub fn apply(&self, image: &DynamicImage) -> Result<DynamicImage> {
        match *self {
            Self::GaussianBlur { radius } => filters::gaussian_blur(image, radius),
            Self::UnsharpMask {
                radius,
                percent,
                threshold,
            } => filters::unsharp_mask(image, radius, percent, threshold),
            Self::AutoContrast {
                cutoff_low,
                cutoff_high,
            } => filters::autocontrast(image, cutoff_low, cutoff_high),
            Self::Grayscale => filters::grayscale(image),
            Self::Desaturate { factor } => filters::desaturate(image, factor),
        }
    }
}

const MACHINE_STEPS: &[FilterStep] = &[
    FilterStep::UnsharpMask {
        radius: 15.0,
        percent: 200,
        threshold: 18,
    },
    FilterStep::AutoContrast {
        cutoff_low: 17.0,
        cutoff_high: 81.0,
    },
    FilterStep::Grayscale,
];

const HUMAN_STEPS: &[FilterStep] = &[
    FilterStep::GaussianBlur { radius: 1.0 },
    FilterStep::UnsharpMask {
        radius: 2.0,
        percent: 150,
        threshold: 3,
    },
    FilterStep::AutoContrast {
        cutoff_low: 10.0,
        cutoff_high: 30.0,
    },
    FilterStep::Desaturate { factor: 0.2 },
];

/// Named enhancement pipeline.
///
/// - `Machine` maximizes OCR token confidence: strong sharpening, a narrow
///   contrast window and grayscale output.
/// - `Human` is tuned for archivists reading the scan: light smoothing,
///   moderate sharpening, a wider contrast window and muted color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementProfile {
    Machine,
    Human,
}

impl EnhancementProfile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Human => "human",
        }
    }

    pub fn steps(&self) -> &'static [FilterStep] {
        match self {
            Self::Machine => MACHINE_STEPS,
            Self::Human => HUMAN_STEPS,
        }
    }

    /// Run every step in order on a copy of `image`.
    pub fn apply(&self, image: &DynamicImage) -> Result<EnhancedImage> {
        filters::ensure_supported(image)?;

        let mut current = image.clone();
        for step in self.steps() {
            tracing::debug!(profile = self.name(), step = step.name(), "applying filter");
            current = step.apply(&current)?;
        }

        Ok(EnhancedImage {
            profile: *self,
            image: current,
        })
    }
}

impl fmt::Display for EnhancementProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raster produced by an enhancement profile, tagged with that profile.
#[derive(Debug, Clone)]
pub struct EnhancedImage {
    profile: EnhancementProfile,
    image: DynamicImage,
}

impl EnhancedImage {
    pub fn profile(&self) -> EnhancementProfile {
        self.profile
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_inner(self) -> DynamicImage {
        self.image
    }

    /// New image rotated counter-clockwise by `degrees`, same profile tag.
    pub fn rotated(&self, degrees: u32) -> Result<Self> {
        Ok(Self {
            profile: self.profile,
            image: filters::rotate_expand(&self.image, degrees)?,
        })
    }
}
