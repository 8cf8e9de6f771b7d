//! Core data model for loaded documents and extraction results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fully-loaded document owned by the registry.
///
/// Created once per load and immutable afterwards. Per-page text, metadata,
/// and the outline are extracted eagerly at load time; `bytes` holds the
/// fetched source snapshot so that image extraction and rendering can
/// re-open the document without re-fetching the location.
///
/// Metadata and outline extraction are best-effort: a failure leaves the
/// field empty/`None` rather than failing the load.
#[derive(Debug)]
pub struct LoadedDocument {
    /// Registry id: digest of the location string (not of the content).
    pub id: String,
    /// The path or URL the document was loaded from.
    pub location: String,
    /// Raw source bytes as fetched at load time.
    pub bytes: Vec<u8>,
    /// Total number of pages.
    pub page_count: usize,
    /// Reconstructed text, one entry per page (index 0 = page 1).
    pub pages: Vec<String>,
    /// Opaque key/value metadata from the source; empty if unavailable.
    pub metadata: BTreeMap<String, String>,
    /// Outline forest, `None` when the source has none.
    pub outline: Option<Vec<OutlineItem>>,
}

/// One entry of a document outline (table of contents).
///
/// Forms a forest; a child's `level` is always its parent's `level + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub title: String,
    /// Depth in the forest, starting at 0 for roots.
    pub level: usize,
    /// Resolved 1-based page number, `None` when resolution failed or the
    /// entry has no destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub children: Vec<OutlineItem>,
}

/// Encoding of an extracted image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    /// Raw data in a color configuration this crate does not convert.
    Unknown,
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Jpeg => write!(f, "jpeg"),
            ImageFormat::Unknown => write!(f, "unknown"),
        }
    }
}

/// Output encoding for page rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    Png,
    Jpeg,
}

impl Default for RenderFormat {
    fn default() -> Self {
        RenderFormat::Png
    }
}

impl std::fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderFormat::Png => write!(f, "png"),
            RenderFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// Descriptor of an image found on a page, without payload bytes.
///
/// Ephemeral: recomputed on each listing call, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    /// 1-based page number.
    pub page: u32,
    /// 0-based index within the page, assigned in paint order.
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// An extracted image with its encoded payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-based page number.
    pub page: u32,
    /// 0-based index within the page, assigned in paint order.
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// Encoded image bytes (PNG or JPEG).
    pub data: Vec<u8>,
}

/// A page rasterized at a caller-chosen DPI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPage {
    /// 1-based page number.
    pub page: u32,
    /// Output width in whole pixels, rounded from the floating viewport.
    pub width: u32,
    /// Output height in whole pixels, rounded from the floating viewport.
    pub height: u32,
    pub format: RenderFormat,
    pub dpi: f32,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

/// A single occurrence of the query on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The literal matched substring, taken from the original page text.
    pub matched_text: String,
    /// Up to 50 characters of surrounding text on each side, clipped to
    /// page bounds and trimmed of leading/trailing whitespace.
    pub context: String,
}

/// All matches on one page, in left-to-right order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// 1-based page number.
    pub page: u32,
    pub hits: Vec<SearchHit>,
}

/// Returned by a successful load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub id: String,
    pub page_count: usize,
}

/// One row of the loaded-documents listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub location: String,
    pub page_count: usize,
}

/// Full record of a loaded document minus the page bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub location: String,
    pub page_count: usize,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<Vec<OutlineItem>>,
}

impl From<&LoadedDocument> for DocumentInfo {
    fn from(doc: &LoadedDocument) -> Self {
        DocumentInfo {
            id: doc.id.clone(),
            location: doc.location.clone(),
            page_count: doc.page_count,
            metadata: doc.metadata.clone(),
            outline: doc.outline.clone(),
        }
    }
}
