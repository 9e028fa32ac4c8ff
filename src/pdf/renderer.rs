//! PDFium-backed page rasterizer.
//!
//! Note: pdfium-render's Pdfium struct is not Send+Sync, so the engine only
//! remembers *where* the library was found at startup and binds a fresh
//! instance inside each operation.

use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::rasterizer::{check_page_range, viewport_size, PageRasterizer};
use super::{DocumentInfo, PageInfo, PdfError};
use crate::config::PdfiumConfig;

/// Where the PDFium shared library was located during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// An explicit library file.
    Path(PathBuf),
    /// The platform's default library search.
    System,
}

impl LibrarySource {
    fn bind(&self) -> Result<Pdfium, PdfError> {
        let bindings = match self {
            LibrarySource::Path(path) => Pdfium::bind_to_library(path),
            LibrarySource::System => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| PdfError::EngineUnavailable(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

#[cfg(target_os = "windows")]
const PLATFORM_LIBRARY_NAME: &str = "pdfium.dll";
#[cfg(target_os = "macos")]
const PLATFORM_LIBRARY_NAME: &str = "libpdfium.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const PLATFORM_LIBRARY_NAME: &str = "libpdfium.so";

/// Candidate library locations, most specific first.
fn candidate_sources(config: &PdfiumConfig) -> Vec<LibrarySource> {
    let mut candidates = Vec::new();

    if let Some(path) = &config.library_path {
        candidates.push(LibrarySource::Path(path.clone()));
    }

    // Bundled next to the executable (Tauri puts resources there on Windows
    // and Linux, under Contents/Frameworks on macOS).
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            #[cfg(target_os = "macos")]
            candidates.push(LibrarySource::Path(
                exe_dir.join("..").join("Frameworks").join("libpdfium.dylib"),
            ));
            candidates.push(LibrarySource::Path(exe_dir.join(PLATFORM_LIBRARY_NAME)));
        }
    }

    candidates.push(LibrarySource::System);

    #[cfg(target_os = "macos")]
    candidates.push(LibrarySource::Path(PathBuf::from(
        "/usr/local/lib/libpdfium.dylib",
    )));

    // Bare name: let the dynamic loader search its own paths.
    candidates.push(LibrarySource::Path(PathBuf::from(PLATFORM_LIBRARY_NAME)));

    candidates
}

fn is_usable(source: &LibrarySource) -> bool {
    match source {
        // Bare file names are resolved by the dynamic loader, not the filesystem.
        LibrarySource::Path(path) if path.components().count() > 1 => path.exists(),
        _ => true,
    }
}

/// Rasterization engine built on PDFium.
#[derive(Debug, Clone)]
pub struct PdfiumEngine {
    source: LibrarySource,
}

impl PdfiumEngine {
    /// Locate and test-bind the PDFium library. Called once at startup.
    pub fn initialize(config: &PdfiumConfig) -> Result<Self, PdfError> {
        for source in candidate_sources(config) {
            if !is_usable(&source) {
                continue;
            }
            match source.bind() {
                Ok(_) => {
                    info!(?source, "PDFium library loaded");
                    return Ok(Self { source });
                }
                Err(e) => debug!(?source, error = %e, "PDFium candidate rejected"),
            }
        }

        Err(PdfError::EngineUnavailable(
            "Could not load the PDFium library. Set PDFIUM_LIBRARY_PATH or bundle it next to the executable."
                .to_string(),
        ))
    }
}

fn load_document<'a>(pdfium: &'a Pdfium, bytes: &'a [u8]) -> Result<PdfDocument<'a>, PdfError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| PdfError::LoadError(format!("{:?}", e)))
}

/// Zero-based page index for a 1-based page number, checked against the document.
fn page_index(doc: &PdfDocument, page_number: u32) -> Result<u16, PdfError> {
    check_page_range(page_number, doc.pages().len() as u32)?;
    Ok((page_number - 1) as u16)
}

fn page_error(page_number: u32, doc: &PdfDocument) -> PdfError {
    PdfError::PageOutOfRange {
        page: page_number,
        page_count: doc.pages().len() as u32,
    }
}

fn intrinsic_rotation(page: &PdfPage) -> i32 {
    match page.rotation() {
        Ok(PdfPageRenderRotation::None) | Err(_) => 0,
        Ok(PdfPageRenderRotation::Degrees90) => 90,
        Ok(PdfPageRenderRotation::Degrees180) => 180,
        Ok(PdfPageRenderRotation::Degrees270) => 270,
    }
}

impl PageRasterizer for PdfiumEngine {
    fn open(&self, bytes: &[u8]) -> Result<DocumentInfo, PdfError> {
        let pdfium = self.source.bind()?;
        let doc = load_document(&pdfium, bytes)?;

        let metadata = doc.metadata();
        let title = metadata
            .get(PdfDocumentMetadataTagType::Title)
            .map(|t| t.value().to_string());
        let author = metadata
            .get(PdfDocumentMetadataTagType::Author)
            .map(|t| t.value().to_string());

        Ok(DocumentInfo {
            page_count: doc.pages().len() as u32,
            title,
            author,
            pdf_version: format!("{:?}", doc.version()),
        })
    }

    fn page_info(&self, bytes: &[u8], page_number: u32) -> Result<PageInfo, PdfError> {
        let pdfium = self.source.bind()?;
        let doc = load_document(&pdfium, bytes)?;
        let page = doc
            .pages()
            .get(page_index(&doc, page_number)?)
            .map_err(|_| page_error(page_number, &doc))?;

        Ok(PageInfo {
            page_number,
            width: page.width().value,
            height: page.height().value,
            rotation: intrinsic_rotation(&page),
        })
    }

    fn rasterize(
        &self,
        bytes: &[u8],
        page_number: u32,
        scale: f32,
    ) -> Result<image::DynamicImage, PdfError> {
        let pdfium = self.source.bind()?;
        let doc = load_document(&pdfium, bytes)?;
        let page = doc
            .pages()
            .get(page_index(&doc, page_number)?)
            .map_err(|_| page_error(page_number, &doc))?;

        let (width, height) = viewport_size(page.width().value, page.height().value, scale);

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::RenderError(format!("{:?}", e)))?;

        Ok(bitmap.as_image())
    }
}

/// Engine used when PDFium could not be located at startup.
///
/// Keeps the window usable: every operation reports why rendering is off.
#[derive(Debug, Clone)]
pub struct UnavailableRasterizer {
    reason: String,
}

impl UnavailableRasterizer {
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(%reason, "rasterization disabled");
        Self { reason }
    }

    fn error(&self) -> PdfError {
        PdfError::EngineUnavailable(self.reason.clone())
    }
}

impl PageRasterizer for UnavailableRasterizer {
    fn open(&self, _bytes: &[u8]) -> Result<DocumentInfo, PdfError> {
        Err(self.error())
    }

    fn page_info(&self, _bytes: &[u8], _page_number: u32) -> Result<PageInfo, PdfError> {
        Err(self.error())
    }

    fn rasterize(
        &self,
        _bytes: &[u8],
        _page_number: u32,
        _scale: f32,
    ) -> Result<image::DynamicImage, PdfError> {
        Err(self.error())
    }
}
