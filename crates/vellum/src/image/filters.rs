//! Pixel filter primitives used by the enhancement profiles.
//!
//! All filters are pure: they take a borrowed image and return a new one.
//! Only 8-bit rasters (luma, luma+alpha, RGB, RGBA) are supported; anything
//! else is rejected with an enhancement error before any work is done.
//! Alpha channels are carried through untouched.

use crate::error::{Result, VellumError};
use image::{DynamicImage, ImageBuffer, Pixel};

/// Reject images the filters cannot process.
pub fn ensure_supported(image: &DynamicImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(VellumError::enhancement(format!(
            "Image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => Ok(()),
        other => Err(VellumError::enhancement(format!(
            "Unsupported color mode {:?}; only 8-bit luma and RGB images can be enhanced",
            other.color()
        ))),
    }
}

/// Convert to 8-bit grayscale. Alpha is dropped.
pub fn grayscale(image: &DynamicImage) -> Result<DynamicImage> {
    ensure_supported(image)?;
    Ok(DynamicImage::ImageLuma8(image.to_luma8()))
}

/// Gaussian blur; `radius` is the standard deviation in pixels.
pub fn gaussian_blur(image: &DynamicImage, radius: f32) -> Result<DynamicImage> {
    ensure_supported(image)?;
    if radius <= 0.0 {
        return Ok(image.clone());
    }
    Ok(image.blur(radius))
}

/// Unsharp mask: every color sample whose difference from the blurred image is
/// at least `threshold` is pushed away from it by `percent` percent of that difference.
pub fn unsharp_mask(image: &DynamicImage, radius: f32, percent: i32, threshold: i32) -> Result<DynamicImage> {
    ensure_supported(image)?;
    if radius <= 0.0 {
        return Ok(image.clone());
    }

    let out = match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(sharpen_buffer(buf, radius, percent, threshold, 1)),
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(sharpen_buffer(buf, radius, percent, threshold, 1))
        }
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(sharpen_buffer(buf, radius, percent, threshold, 3)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(sharpen_buffer(buf, radius, percent, threshold, 3)),
        _ => unreachable!("color mode checked by ensure_supported"),
    };
    Ok(out)
}

fn sharpen_buffer<P>(
    buf: &ImageBuffer<P, Vec<u8>>,
    radius: f32,
    percent: i32,
    threshold: i32,
    color_channels: usize,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let blurred = image::imageops::blur(buf, radius);
    let mut out = buf.clone();

    for (pixel, soft) in out.pixels_mut().zip(blurred.pixels()) {
        let soft = soft.channels();
        for (c, sample) in pixel.channels_mut().iter_mut().take(color_channels).enumerate() {
            let diff = i32::from(*sample) - i32::from(soft[c]);
            if diff.abs() >= threshold {
                *sample = clamp_u8(i32::from(*sample) + diff * percent / 100);
            }
        }
    }
    out
}

/// Stretch contrast per color channel after discarding `cutoff_low` percent of
/// the darkest and `cutoff_high` percent of the brightest samples.
///
/// A channel whose remaining histogram collapses to a single value is left as is.
pub fn autocontrast(image: &DynamicImage, cutoff_low: f32, cutoff_high: f32) -> Result<DynamicImage> {
    ensure_supported(image)?;
    if !(0.0..=100.0).contains(&cutoff_low) || !(0.0..=100.0).contains(&cutoff_high) {
        return Err(VellumError::enhancement(format!(
            "Autocontrast cutoff must be within 0..=100 percent (got {}, {})",
            cutoff_low, cutoff_high
        )));
    }

    let out = match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(stretch_buffer(buf, cutoff_low, cutoff_high, 1)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(stretch_buffer(buf, cutoff_low, cutoff_high, 1)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(stretch_buffer(buf, cutoff_low, cutoff_high, 3)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(stretch_buffer(buf, cutoff_low, cutoff_high, 3)),
        _ => unreachable!("color mode checked by ensure_supported"),
    };
    Ok(out)
}

fn stretch_buffer<P>(
    buf: &ImageBuffer<P, Vec<u8>>,
    cutoff_low: f32,
    cutoff_high: f32,
    color_channels: usize,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let mut histograms = vec![[0u64; 256]; color_channels];
    for pixel in buf.pixels() {
        for (c, sample) in pixel.channels().iter().take(color_channels).enumerate() {
            histograms[c][usize::from(*sample)] += 1;
        }
    }

    let luts: Vec<[u8; 256]> = histograms
        .iter()
        .map(|histogram| contrast_lut(histogram, cutoff_low, cutoff_high))
        .collect();

    let mut out = buf.clone();
    for pixel in out.pixels_mut() {
        for (c, sample) in pixel.channels_mut().iter_mut().take(color_channels).enumerate() {
            *sample = luts[c][usize::from(*sample)];
        }
    }
    out
}

/// Build the lookup table for one channel histogram.
pub(crate) fn contrast_lut(histogram: &[u64; 256], cutoff_low: f32, cutoff_high: f32) -> [u8; 256] {
    let mut h = *histogram;
    let total: u64 = h.iter().sum();

    let mut cut = (total as f64 * f64::from(cutoff_low) / 100.0).floor() as u64;
    for count in h.iter_mut() {
        if cut == 0 {
            break;
        }
        let taken = cut.min(*count);
        *count -= taken;
        cut -= taken;
    }

    let mut cut = (total as f64 * f64::from(cutoff_high) / 100.0).floor() as u64;
    for count in h.iter_mut().rev() {
        if cut == 0 {
            break;
        }
        let taken = cut.min(*count);
        *count -= taken;
        cut -= taken;
    }

    let lo = h.iter().position(|&count| count > 0);
    let hi = h.iter().rposition(|&count| count > 0);

    let mut lut = [0u8; 256];
    match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => {
            let scale = 255.0 / (hi - lo) as f64;
            let offset = -(lo as f64) * scale;
            for (ix, entry) in lut.iter_mut().enumerate() {
                *entry = clamp_u8((ix as f64 * scale + offset) as i32);
            }
        }
        _ => {
            for (ix, entry) in lut.iter_mut().enumerate() {
                *entry = ix as u8;
            }
        }
    }
    lut
}

/// Blend toward grayscale. `factor` 0.0 gives a gray image, 1.0 leaves the colors unchanged.
///
/// The gray reference uses ITU-R 601 weights, the same as an `L` conversion,
/// not the Rec. 709 weights of [`DynamicImage::to_luma8`].
pub fn desaturate(image: &DynamicImage, factor: f32) -> Result<DynamicImage> {
    ensure_supported(image)?;
    if !(0.0..=1.0).contains(&factor) {
        return Err(VellumError::enhancement(format!(
            "Desaturation factor must be within 0..=1 (got {})",
            factor
        )));
    }

    let out = match image {
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(desaturate_buffer(buf, factor)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(desaturate_buffer(buf, factor)),
        // Luma images carry no color to remove.
        other => other.clone(),
    };
    Ok(out)
}

fn desaturate_buffer<P>(buf: &ImageBuffer<P, Vec<u8>>, factor: f32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let mut out = buf.clone();
    for pixel in out.pixels_mut() {
        let channels = pixel.channels_mut();
        let gray = luma601(channels[0], channels[1], channels[2]);
        for sample in channels.iter_mut().take(3) {
            *sample = blend(gray, *sample, factor);
        }
    }
    out
}

/// ITU-R 601 luma in 16-bit fixed point, rounded.
pub(crate) fn luma601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471;
    ((weighted + 0x8000) >> 16) as u8
}

fn blend(gray: u8, color: u8, factor: f32) -> u8 {
    let value = f32::from(gray) + (f32::from(color) - f32::from(gray)) * factor;
    clamp_u8(value.round() as i32)
}

/// Rotate counter-clockwise by a multiple of 90 degrees. The canvas grows to fit,
/// so nothing is cropped.
pub fn rotate_expand(image: &DynamicImage, degrees_ccw: u32) -> Result<DynamicImage> {
    match degrees_ccw % 360 {
        0 => Ok(image.clone()),
        90 => Ok(image.rotate270()),
        180 => Ok(image.rotate180()),
        270 => Ok(image.rotate90()),
        other => Err(VellumError::enhancement(format!(
            "Rotation must be a multiple of 90 degrees (got {})",
            other
        ))),
    }
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}
