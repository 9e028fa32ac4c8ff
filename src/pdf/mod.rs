//! Page rasterization for the overlay.
//!
//! This module provides:
//! - The `PageRasterizer` seam and its PDFium implementation
//! - Viewport sizing and page-range checks shared by every engine
//! - PNG data URI encoding of rendered pages

mod rasterizer;
mod renderer;

#[cfg(test)]
pub(crate) mod testing;

pub use rasterizer::*;
pub use renderer::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or rendering documents.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdfError {
    /// No file, an empty file, or an unreadable file was chosen.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// The rasterization engine could not be reached at startup.
    #[error("Rasterization engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    #[error("No document loaded")]
    NoDocument,

    #[error("Page {page} is outside the document (1-{page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("Invalid value: {0}")]
    InvalidParameter(String),

    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Image encoding failed: {0}")]
    ImageError(String),
}

impl Serialize for PdfError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Total number of pages
    pub page_count: u32,
    /// Document title (if available)
    pub title: Option<String>,
    /// Document author (if available)
    pub author: Option<String>,
    /// PDF version string
    pub pdf_version: String,
}

/// Page metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-based)
    pub page_number: u32,
    /// Page width in PDF points
    pub width: f32,
    /// Page height in PDF points
    pub height: f32,
    /// Intrinsic page rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}
