//! Page rasterization at caller-chosen resolution.
//!
//! A DPI value maps to a scale factor against the PDF coordinate space
//! (72 units per inch). The page's native box is scaled into a floating
//! viewport, rounded to whole pixels for the output surface, painted by
//! Pdfium onto a fresh bitmap, and encoded with the `image` crate.

use super::bindings::bind_pdfium;
use super::error::{PdfError, Result};
use crate::types::{RenderFormat, RenderedPage};
use pdfium_render::prelude::*;
use std::io::Cursor;

const PDF_POINTS_PER_INCH: f32 = 72.0;

/// JPEG output quality. Renders are meant for inspection, so quality wins
/// over size.
const JPEG_QUALITY: u8 = 95;

/// Round a page's native size (in points) to output pixels at a DPI.
pub fn scaled_dimensions(width_points: f32, height_points: f32, dpi: f32) -> (u32, u32) {
    let scale = dpi / PDF_POINTS_PER_INCH;
    let width = (width_points * scale).round().max(1.0) as u32;
    let height = (height_points * scale).round().max(1.0) as u32;
    (width, height)
}

/// Render one page to an encoded image.
///
/// `page_number` is 1-based and must already be validated against the
/// document's page count; an out-of-range page here (a disagreement
/// between layers) surfaces as [`PdfError::PageNotFound`].
pub fn render_page(
    pdf_bytes: &[u8],
    page_number: u32,
    dpi: f32,
    format: RenderFormat,
) -> Result<RenderedPage> {
    let bindings = bind_pdfium(PdfError::RenderingFailed, "page rendering")?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| PdfError::InvalidPdf(e.to_string()))?;

    let page_index = page_number.saturating_sub(1);
    let page = document
        .pages()
        .get(page_index as u16)
        .map_err(|_| PdfError::PageNotFound(page_number as usize))?;

    let (width, height) = scaled_dimensions(page.width().value, page.height().value, dpi);

    let config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_target_height(height as i32)
        .rotate_if_landscape(PdfPageRenderRotation::None, false);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page: {}", e)))?;

    let image = bitmap.as_image();
    let data = encode_image(&image, format)?;

    Ok(RenderedPage {
        page: page_number,
        width,
        height,
        format,
        dpi,
        data,
    })
}

/// Encode a rendered bitmap in the requested output format.
fn encode_image(image: &image::DynamicImage, format: RenderFormat) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match format {
        RenderFormat::Png => {
            image
                .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                .map_err(|e| PdfError::RenderingFailed(format!("PNG encoding failed: {}", e)))?;
        }
        RenderFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = image.to_rgb8();
            let mut cursor = Cursor::new(&mut bytes);
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut cursor,
                JPEG_QUALITY,
            );
            encoder
                .encode_image(&rgb)
                .map_err(|e| PdfError::RenderingFailed(format!("JPEG encoding failed: {}", e)))?;
        }
    }
    Ok(bytes)
}
