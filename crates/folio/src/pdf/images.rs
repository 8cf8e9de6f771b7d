//! Embedded image discovery and decoding.
//!
//! A page's content stream is scanned linearly for image paints: `Do`
//! operators whose operand resolves to an `/Image` XObject (this covers
//! plain images, JPEG-encoded images, and image masks, which differ only
//! in their stream dictionaries). Each referenced resource is classified
//! by sniffing its first two bytes: `FF D8` is JPEG, `89 50` is PNG, and
//! anything else is raw pixel data that gets converted to RGBA (RGB
//! copied, grayscale replicated across channels, 1-bit masks expanded)
//! and encoded as PNG.
//!
//! Failures local to one image are logged and skipped; they never fail
//! the page.

use super::error::{PdfError, Result};
use super::object::resolve;
use crate::types::{ImageFormat, ImageInfo, PageImage};
use image::RgbaImage;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;

/// Guard against malformed `Parent` chains when resolving resources.
const MAX_PARENT_DEPTH: usize = 64;

/// Describe the images painted on a page, in paint order, without decoding
/// payloads.
pub fn list_page_images(
    doc: &Document,
    page_id: ObjectId,
    page_number: u32,
) -> Result<Vec<ImageInfo>> {
    let mut infos = Vec::new();
    for (index, stream) in image_xobjects(doc, page_id)?.into_iter().enumerate() {
        match sniff_xobject(doc, stream) {
            Ok(sniffed) => infos.push(ImageInfo {
                page: page_number,
                index: index as u32,
                width: sniffed.width,
                height: sniffed.height,
                format: sniffed.format(),
            }),
            Err(e) => {
                tracing::debug!(
                    "Skipping unreadable image {} on page {}: {}",
                    index,
                    page_number,
                    e
                );
            }
        }
    }
    Ok(infos)
}

/// Decode the images painted on a page, in paint order.
///
/// Images that cannot be decoded (unreadable streams, unsupported color
/// configurations) are logged and skipped.
pub fn extract_page_images(
    doc: &Document,
    page_id: ObjectId,
    page_number: u32,
) -> Result<Vec<PageImage>> {
    let mut images = Vec::new();
    for (index, stream) in image_xobjects(doc, page_id)?.into_iter().enumerate() {
        let sniffed = match sniff_xobject(doc, stream) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(
                    "Skipping unreadable image {} on page {}: {}",
                    index,
                    page_number,
                    e
                );
                continue;
            }
        };

        let width = sniffed.width;
        let height = sniffed.height;
        match sniffed.into_encoded() {
            Ok((format, data)) => images.push(PageImage {
                page: page_number,
                index: index as u32,
                width,
                height,
                format,
                data,
            }),
            Err(e) => {
                tracing::debug!(
                    "Skipping undecodable image {} on page {}: {}",
                    index,
                    page_number,
                    e
                );
            }
        }
    }
    Ok(images)
}

/// An image resource after classification, before payload encoding.
struct SniffedImage {
    width: u32,
    height: u32,
    payload: Payload,
}

enum Payload {
    /// Already in a transportable encoding (JPEG or PNG passthrough).
    Encoded(ImageFormat, Vec<u8>),
    /// Raw samples awaiting RGBA conversion and PNG encoding.
    Raw(RawColor, Vec<u8>),
    /// A color configuration this crate does not convert.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RawColor {
    Gray8,
    Rgb8,
    Bilevel,
}

impl SniffedImage {
    /// The format an extraction of this image would yield.
    fn format(&self) -> ImageFormat {
        match &self.payload {
            Payload::Encoded(format, _) => *format,
            Payload::Raw(_, _) => ImageFormat::Png,
            Payload::Unsupported => ImageFormat::Unknown,
        }
    }

    /// Produce the transportable payload, converting raw samples to PNG.
    fn into_encoded(self) -> Result<(ImageFormat, Vec<u8>)> {
        match self.payload {
            Payload::Encoded(format, data) => Ok((format, data)),
            Payload::Raw(color, data) => {
                let rgba = raw_to_rgba(color, &data, self.width, self.height)?;
                let png = encode_png_rgba(self.width, self.height, rgba)?;
                Ok((ImageFormat::Png, png))
            }
            Payload::Unsupported => Err(PdfError::ImageExtractionFailed(
                "unsupported color configuration".to_string(),
            )),
        }
    }
}

/// Classify an image's payload by its leading bytes.
fn classify_bytes(data: &[u8]) -> ImageFormat {
    match data {
        [0xFF, 0xD8, ..] => ImageFormat::Jpeg,
        [0x89, 0x50, ..] => ImageFormat::Png,
        _ => ImageFormat::Unknown,
    }
}

/// Resolve an image XObject stream into a classified image.
fn sniff_xobject(doc: &Document, stream: &Stream) -> Result<SniffedImage> {
    let width = dict_u32(&stream.dict, b"Width")?;
    let height = dict_u32(&stream.dict, b"Height")?;

    // DCTDecode streams are JPEG bytes as stored; everything else is
    // unfiltered first.
    let data = if has_filter(doc, &stream.dict, b"DCTDecode") {
        stream.content.clone()
    } else if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().map_err(|e| {
            PdfError::ImageExtractionFailed(format!("Failed to unfilter image stream: {}", e))
        })?
    } else {
        stream.content.clone()
    };

    let payload = match classify_bytes(&data) {
        ImageFormat::Jpeg => Payload::Encoded(ImageFormat::Jpeg, data),
        ImageFormat::Png => Payload::Encoded(ImageFormat::Png, data),
        ImageFormat::Unknown => match raw_color_kind(doc, &stream.dict) {
            Some(color) => Payload::Raw(color, data),
            None => Payload::Unsupported,
        },
    };

    Ok(SniffedImage {
        width,
        height,
        payload,
    })
}

/// Whether the stream's `Filter` entry (name or array) includes `name`.
fn has_filter(doc: &Document, dict: &Dictionary, name: &[u8]) -> bool {
    let Some(filter) = dict.get(b"Filter").ok().and_then(|o| resolve(doc, o)) else {
        return false;
    };
    match filter {
        Object::Name(n) => n.as_slice() == name,
        Object::Array(arr) => arr
            .iter()
            .any(|f| matches!(resolve(doc, f), Some(Object::Name(n)) if n.as_slice() == name)),
        _ => false,
    }
}

/// Determine the raw sample layout from the stream dictionary.
fn raw_color_kind(doc: &Document, dict: &Dictionary) -> Option<RawColor> {
    if let Ok(Object::Boolean(true)) = dict.get(b"ImageMask") {
        return Some(RawColor::Bilevel);
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    let components = color_space_components(doc, dict.get(b"ColorSpace").ok()?)?;
    match (components, bits) {
        (1, 8) => Some(RawColor::Gray8),
        (1, 1) => Some(RawColor::Bilevel),
        (3, 8) => Some(RawColor::Rgb8),
        _ => None,
    }
}

/// Number of components of a color space object, where this crate
/// understands it (device/CIE gray and RGB, ICC by its `N` entry).
fn color_space_components(doc: &Document, cs: &Object) -> Option<u32> {
    match resolve(doc, cs)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => Some(1),
            b"DeviceRGB" | b"CalRGB" => Some(3),
            _ => None,
        },
        Object::Array(arr) => {
            let Object::Name(family) = resolve(doc, arr.first()?)? else {
                return None;
            };
            if family.as_slice() != b"ICCBased" {
                return None;
            }
            let icc = resolve(doc, arr.get(1)?)?.as_stream().ok()?;
            match icc.dict.get(b"N").ok()?.as_i64().ok()? {
                1 => Some(1),
                3 => Some(3),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Convert raw samples to a tightly-packed RGBA buffer.
fn raw_to_rgba(color: RawColor, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let pixels = (width as usize) * (height as usize);
    let mut rgba = Vec::with_capacity(pixels * 4);

    match color {
        RawColor::Gray8 => {
            if data.len() < pixels {
                return Err(short_data_error(data.len(), pixels));
            }
            for &s in &data[..pixels] {
                rgba.extend_from_slice(&[s, s, s, 0xFF]);
            }
        }
        RawColor::Rgb8 => {
            if data.len() < pixels * 3 {
                return Err(short_data_error(data.len(), pixels * 3));
            }
            for px in data[..pixels * 3].chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 0xFF]);
            }
        }
        RawColor::Bilevel => {
            // Rows are byte-aligned at 1 bit per sample.
            let stride = ((width as usize) + 7) / 8;
            if data.len() < stride * height as usize {
                return Err(short_data_error(data.len(), stride * height as usize));
            }
            for row in 0..height as usize {
                let row_bytes = &data[row * stride..(row + 1) * stride];
                for col in 0..width as usize {
                    let bit = (row_bytes[col / 8] >> (7 - (col % 8))) & 1;
                    let s = if bit == 1 { 0xFF } else { 0x00 };
                    rgba.extend_from_slice(&[s, s, s, 0xFF]);
                }
            }
        }
    }

    Ok(rgba)
}

fn short_data_error(got: usize, expected: usize) -> PdfError {
    PdfError::ImageExtractionFailed(format!(
        "image data too short: {} bytes, expected {}",
        got, expected
    ))
}

/// Encode an RGBA buffer as PNG bytes.
fn encode_png_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>> {
    let img = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        PdfError::ImageExtractionFailed("RGBA buffer does not match dimensions".to_string())
    })?;

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| PdfError::ImageExtractionFailed(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

/// Collect the image XObject streams a page paints, in paint order.
fn image_xobjects(doc: &Document, page_id: ObjectId) -> Result<Vec<&Stream>> {
    let content = page_content_bytes(doc, page_id)?;
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let operations = match Content::decode(&content) {
        Ok(content) => content.operations,
        Err(e) => {
            return Err(PdfError::ImageExtractionFailed(format!(
                "Failed to decode content stream: {}",
                e
            )))
        }
    };

    let xobjects = page_xobject_dict(doc, page_id);
    let mut streams = Vec::new();

    for op in &operations {
        if op.operator != "Do" {
            continue;
        }
        let Some(Object::Name(name)) = op.operands.first() else {
            continue;
        };
        let Some(xobjects) = xobjects else {
            continue;
        };
        let Some(stream) = xobjects
            .get(name.as_slice())
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
        else {
            continue;
        };

        let is_image = matches!(
            stream.dict.get(b"Subtype"),
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Image"
        );
        if is_image {
            streams.push(stream);
        }
    }

    Ok(streams)
}

/// The page's XObject resource dictionary, honoring `Resources` inheritance
/// through the page tree.
fn page_xobject_dict(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            return None;
        }

        let dict = doc.get_object(id).ok()?.as_dict().ok()?;
        if let Ok(resources) = dict.get(b"Resources") {
            let resources = resolve(doc, resources)?.as_dict().ok()?;
            return resolve(doc, resources.get(b"XObject").ok()?)?.as_dict().ok();
        }

        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => Some(*parent),
            _ => None,
        };
    }

    None
}

/// Concatenated, unfiltered content-stream bytes of a page.
fn page_content_bytes(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page = doc
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| PdfError::ImageExtractionFailed(format!("Bad page object: {}", e)))?;

    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };

    match contents {
        Object::Reference(id) => {
            let stream = doc
                .get_object(*id)
                .and_then(|o| o.as_stream())
                .map_err(|e| {
                    PdfError::ImageExtractionFailed(format!("/Contents is not a stream: {}", e))
                })?;
            content_stream_bytes(stream)
        }
        Object::Array(parts) => {
            let mut content = Vec::new();
            for part in parts {
                let Some(stream) = resolve(doc, part).and_then(|o| o.as_stream().ok()) else {
                    continue;
                };
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&content_stream_bytes(stream)?);
            }
            Ok(content)
        }
        _ => Ok(Vec::new()),
    }
}

fn content_stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content().map_err(|e| {
            PdfError::ImageExtractionFailed(format!("Failed to decompress content stream: {}", e))
        })
    } else {
        Ok(stream.content.clone())
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let value = dict
        .get(key)
        .and_then(|o| o.as_i64())
        .map_err(|e| {
            PdfError::ImageExtractionFailed(format!(
                "Missing image dimension {}: {}",
                String::from_utf8_lossy(key),
                e
            ))
        })?;
    u32::try_from(value).map_err(|_| {
        PdfError::ImageExtractionFailed(format!(
            "Image dimension {} out of range: {}",
            String::from_utf8_lossy(key),
            value
        ))
    })
}
