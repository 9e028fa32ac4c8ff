//! In-memory rasterizer for tests; no PDFium library required.

use image::{DynamicImage, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};

use super::{check_page_range, viewport_size, DocumentInfo, PageInfo, PageRasterizer, PdfError};

pub const PAGE_WIDTH: f32 = 100.0;
pub const PAGE_HEIGHT: f32 = 140.0;

/// Bytes the fake engine accepts as a document.
pub fn fake_pdf() -> Vec<u8> {
    b"%PDF-1.7 fake document".to_vec()
}

struct Hold {
    started: Sender<()>,
    release: Receiver<()>,
}

impl Hold {
    fn wait(hold: Option<Hold>) {
        if let Some(hold) = hold {
            let _ = hold.started.send(());
            let _ = hold.release.recv();
        }
    }
}

/// Renders every page as a solid colour that depends only on the page number.
pub struct FakeRasterizer {
    page_count: u32,
    holds: Mutex<HashMap<u32, Hold>>,
    open_hold: Mutex<Option<Hold>>,
    rasterize_calls: AtomicUsize,
}

impl FakeRasterizer {
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            holds: Mutex::new(HashMap::new()),
            open_hold: Mutex::new(None),
            rasterize_calls: AtomicUsize::new(0),
        }
    }

    /// The next rasterization of `page` signals `started`, then blocks until
    /// `release` receives.
    pub fn hold_page(self, page: u32, started: Sender<()>, release: Receiver<()>) -> Self {
        self.holds.lock().insert(page, Hold { started, release });
        self
    }

    /// Same as `hold_page`, for the next document open.
    pub fn hold_open(self, started: Sender<()>, release: Receiver<()>) -> Self {
        *self.open_hold.lock() = Some(Hold { started, release });
        self
    }

    pub fn rasterize_calls(&self) -> usize {
        self.rasterize_calls.load(Ordering::SeqCst)
    }

    fn check_bytes(bytes: &[u8]) -> Result<(), PdfError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(PdfError::LoadError("missing %PDF header".to_string()));
        }
        Ok(())
    }
}

impl PageRasterizer for FakeRasterizer {
    fn open(&self, bytes: &[u8]) -> Result<DocumentInfo, PdfError> {
        Self::check_bytes(bytes)?;
        let hold = self.open_hold.lock().take();
        Hold::wait(hold);
        Ok(DocumentInfo {
            page_count: self.page_count,
            title: Some("Fake".to_string()),
            author: None,
            pdf_version: "Pdf1_7".to_string(),
        })
    }

    fn page_info(&self, bytes: &[u8], page_number: u32) -> Result<PageInfo, PdfError> {
        Self::check_bytes(bytes)?;
        check_page_range(page_number, self.page_count)?;
        Ok(PageInfo {
            page_number,
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            rotation: 0,
        })
    }

    fn rasterize(
        &self,
        bytes: &[u8],
        page_number: u32,
        scale: f32,
    ) -> Result<DynamicImage, PdfError> {
        self.rasterize_calls.fetch_add(1, Ordering::SeqCst);
        Self::check_bytes(bytes)?;
        check_page_range(page_number, self.page_count)?;

        let hold = self.holds.lock().remove(&page_number);
        Hold::wait(hold);

        let (width, height) = viewport_size(PAGE_WIDTH, PAGE_HEIGHT, scale);
        let shade = (page_number * 40 % 256) as u8;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([shade, 255 - shade, 128, 255]),
        )))
    }
}
