use crate::error::{Result, VellumError};
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// Decode an image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| {
        VellumError::enhancement_with_source(format!("Failed to decode image {}", path.display()), e)
    })
}

/// Encode `image` to `path`, picking the format from the extension.
///
/// JPEG cannot hold an alpha channel, so alpha is flattened away for
/// `.jpg`/`.jpeg` targets.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        VellumError::persistence_with_source(format!("Unknown image format for {}", path.display()), e)
    })?;

    let result = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        let flattened = if image.color().has_color() {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(image.to_luma8())
        };
        flattened.save_with_format(path, format)
    } else {
        image.save_with_format(path, format)
    };

    result.map_err(|e| VellumError::persistence_with_source(format!("Failed to write image {}", path.display()), e))
}
