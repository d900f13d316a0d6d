//! Image enhancement.
//!
//! Two fixed profiles turn a raw scan into renditions for different readers:
//!
//! - [`EnhancementProfile::Machine`] feeds the OCR engine,
//! - [`EnhancementProfile::Human`] is what gets archived for people to read.
//!
//! The profiles are built from the pure primitives in [`filters`].
//!
//! # Example
//!
//! ```rust,no_run
//! use vellum::image::{EnhancementProfile, load_image};
//!
//! # fn main() -> vellum::Result<()> {
//! let scan = load_image(std::path::Path::new("source/box1/0001.jpg"))?;
//! let for_ocr = EnhancementProfile::Machine.apply(&scan)?;
//! println!("{}x{}", for_ocr.image().width(), for_ocr.image().height());
//! # Ok(())
//! # }
//! ```
pub mod filters;
mod io;
mod profile;

pub use io::{load_image, save_image};
pub use profile::{EnhancedImage, EnhancementProfile, FilterStep};
