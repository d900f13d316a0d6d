//! Text reconstruction from OCR token streams.
mod reconstruct;

pub use reconstruct::{Block, Document, HierarchyLevel, Line, Paragraph, Truncation, reconstruct};
