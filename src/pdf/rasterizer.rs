//! Engine-independent half of page rendering.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::{DocumentInfo, PageInfo, PdfError};

/// A document rasterization engine.
///
/// Implementations receive the raw document bytes on every call; they are
/// free to re-open the document each time.
pub trait PageRasterizer: Send + Sync {
    /// Open the document and read its metadata.
    fn open(&self, bytes: &[u8]) -> Result<DocumentInfo, PdfError>;

    /// Native size of one page.
    fn page_info(&self, bytes: &[u8], page_number: u32) -> Result<PageInfo, PdfError>;

    /// Rasterize one page (1-based) at `scale` times its native size.
    fn rasterize(&self, bytes: &[u8], page_number: u32, scale: f32)
        -> Result<DynamicImage, PdfError>;
}

/// What to render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub page_number: u32,
    pub scale: f32,
    /// Display rotation in degrees. Echoed on the result, not applied to pixels.
    pub rotation: f32,
}

/// A rendered page, ready to hand to the map as an image overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedImage {
    pub document_id: String,
    pub page_number: u32,
    pub scale: f32,
    pub rotation: f32,
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,...`
    pub data_uri: String,
}

/// Fails with `PageOutOfRange` unless `1 <= page_number <= page_count`.
pub fn check_page_range(page_number: u32, page_count: u32) -> Result<(), PdfError> {
    if page_number == 0 || page_number > page_count {
        return Err(PdfError::PageOutOfRange {
            page: page_number,
            page_count,
        });
    }
    Ok(())
}

/// Pixel size of a page of `width` x `height` points rendered at `scale`.
pub fn viewport_size(width: f32, height: f32, scale: f32) -> (u32, u32) {
    let px = |points: f32| (points * scale).round().max(1.0) as u32;
    (px(width), px(height))
}

/// Encode an image as a PNG data URI.
pub fn encode_data_uri(image: &DynamicImage) -> Result<String, PdfError> {
    let mut png_bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| PdfError::ImageError(e.to_string()))?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png_bytes)))
}

/// Render one page of a document into a data URI image.
pub fn render_page(
    engine: &dyn PageRasterizer,
    document_id: &str,
    bytes: &[u8],
    request: &RenderRequest,
) -> Result<RenderedImage, PdfError> {
    if !(request.scale.is_finite() && request.scale > 0.0) {
        return Err(PdfError::InvalidParameter(format!(
            "scale must be positive, got {}",
            request.scale
        )));
    }

    let raster = engine.rasterize(bytes, request.page_number, request.scale)?;
    let data_uri = encode_data_uri(&raster)?;

    Ok(RenderedImage {
        document_id: document_id.to_string(),
        page_number: request.page_number,
        scale: request.scale,
        rotation: request.rotation,
        width: raster.width(),
        height: raster.height(),
        data_uri,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{fake_pdf, FakeRasterizer};
    use image::RgbaImage;

    fn request(page_number: u32, scale: f32) -> RenderRequest {
        RenderRequest {
            page_number,
            scale,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_check_page_range() {
        assert!(check_page_range(1, 3).is_ok());
        assert!(check_page_range(3, 3).is_ok());
        assert_eq!(
            check_page_range(0, 3),
            Err(PdfError::PageOutOfRange { page: 0, page_count: 3 })
        );
        assert_eq!(
            check_page_range(4, 3),
            Err(PdfError::PageOutOfRange { page: 4, page_count: 3 })
        );
    }

    #[test]
    fn test_viewport_size() {
        // US Letter at 72 DPI
        assert_eq!(viewport_size(612.0, 792.0, 1.0), (612, 792));
        assert_eq!(viewport_size(612.0, 792.0, 2.0), (1224, 1584));
        assert_eq!(viewport_size(612.0, 792.0, 0.5), (306, 396));
        // Never collapses to an empty bitmap
        assert_eq!(viewport_size(10.0, 10.0, 0.01), (1, 1));
    }

    #[test]
    fn data_uri_is_a_decodable_png() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, image::Rgba([1, 2, 3, 255])));
        let uri = encode_data_uri(&image).unwrap();

        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = image::load_from_memory(&STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn every_valid_page_renders() {
        let engine = FakeRasterizer::new(3);
        let bytes = fake_pdf();
        for page in 1..=3 {
            let image = render_page(&engine, "doc_1", &bytes, &request(page, 1.0)).unwrap();
            assert_eq!(image.page_number, page);
            assert!(image.data_uri.len() > "data:image/png;base64,".len());
        }
    }

    #[test]
    fn out_of_range_pages_produce_no_image() {
        let engine = FakeRasterizer::new(3);
        let bytes = fake_pdf();
        assert_eq!(
            render_page(&engine, "doc_1", &bytes, &request(4, 1.0)),
            Err(PdfError::PageOutOfRange { page: 4, page_count: 3 })
        );
        assert!(matches!(
            render_page(&engine, "doc_1", &bytes, &request(0, 1.0)),
            Err(PdfError::PageOutOfRange { .. })
        ));
    }

    #[test]
    fn identical_requests_give_identical_images() {
        let engine = FakeRasterizer::new(2);
        let bytes = fake_pdf();
        let first = render_page(&engine, "doc_1", &bytes, &request(2, 1.5)).unwrap();
        let second = render_page(&engine, "doc_1", &bytes, &request(2, 1.5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn doubling_scale_doubles_dimensions() {
        let engine = FakeRasterizer::new(1);
        let bytes = fake_pdf();
        let base = render_page(&engine, "doc_1", &bytes, &request(1, 1.0)).unwrap();
        let doubled = render_page(&engine, "doc_1", &bytes, &request(1, 2.0)).unwrap();
        assert_eq!(doubled.width, base.width * 2);
        assert_eq!(doubled.height, base.height * 2);
    }

    #[test]
    fn rotation_does_not_change_pixels() {
        let engine = FakeRasterizer::new(1);
        let bytes = fake_pdf();
        let upright = render_page(&engine, "doc_1", &bytes, &request(1, 1.0)).unwrap();
        let rotated = render_page(
            &engine,
            "doc_1",
            &bytes,
            &RenderRequest { rotation: 45.0, ..request(1, 1.0) },
        )
        .unwrap();
        assert_eq!(upright.data_uri, rotated.data_uri);
        assert_eq!(rotated.rotation, 45.0);
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let engine = FakeRasterizer::new(1);
        let bytes = fake_pdf();
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                render_page(&engine, "doc_1", &bytes, &request(1, scale)),
                Err(PdfError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        let engine = FakeRasterizer::new(1);
        assert!(matches!(
            render_page(&engine, "doc_1", b"not a pdf", &request(1, 1.0)),
            Err(PdfError::LoadError(_))
        ));
    }
}
