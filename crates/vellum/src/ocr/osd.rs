use super::error::OcrError;
use crate::types::OrientationEstimate;

/// Parse Tesseract's orientation and script detection report (`--psm 0`).
///
/// ```text
/// Page number: 0
/// Orientation in degrees: 270
/// Rotate: 90
/// Orientation confidence: 2.41
/// Script: Latin
/// Script confidence: 1.67
/// ```
///
/// The estimate carries "Orientation in degrees", the counter-clockwise turn
/// that brings the page upright.
pub fn parse_osd(report: &str) -> Result<OrientationEstimate, OcrError> {
    let mut rotation = None;
    let mut confidence = None;
    let mut script = String::new();

    for line in report.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Orientation in degrees" => {
                rotation = Some(value.parse::<u32>().map_err(|_| {
                    OcrError::InvalidOutput(format!("Orientation is not a number: '{}'", value))
                })?);
            }
            "Orientation confidence" => {
                let parsed = value
                    .parse::<f64>()
                    .ok()
                    .filter(|c| c.is_finite())
                    .ok_or_else(|| {
                        OcrError::InvalidOutput(format!("Orientation confidence is not a number: '{}'", value))
                    })?;
                confidence = Some(parsed);
            }
            "Script" => script = value.to_string(),
            _ => {}
        }
    }

    let rotation_degrees =
        rotation.ok_or_else(|| OcrError::InvalidOutput("Orientation missing from OSD report".to_string()))?;
    if !matches!(rotation_degrees, 0 | 90 | 180 | 270) {
        return Err(OcrError::InvalidOutput(format!(
            "Orientation must be 0, 90, 180 or 270 degrees (got {})",
            rotation_degrees
        )));
    }
    let confidence =
        confidence.ok_or_else(|| OcrError::InvalidOutput("Orientation confidence missing from OSD report".to_string()))?;

    Ok(OrientationEstimate {
        rotation_degrees,
        confidence,
        detected_script: script,
    })
}
