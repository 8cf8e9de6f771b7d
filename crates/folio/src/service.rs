//! The document service: the operation surface exposed to callers.
//!
//! Operations either return a payload or a [`FolioError`] whose
//! `user_message()` is what the request/response layer above this crate
//! reports. Failures confined to a single page or image inside a
//! multi-item operation degrade (skip, log) instead of failing the call.

use crate::config::FolioConfig;
use crate::error::{FolioError, Result};
use crate::pdf;
use crate::registry::DocumentRegistry;
use crate::types::{
    DocumentInfo, DocumentSummary, ImageInfo, LoadResult, LoadedDocument, PageImage, RenderFormat,
    RenderedPage, SearchMatch,
};
use std::sync::Arc;

/// Entry point for all document operations.
///
/// Owns the registry; create one per process (or per logical store) and
/// share it behind an `Arc` as needed. There is no global instance.
pub struct DocumentService {
    registry: DocumentRegistry,
}

impl Default for DocumentService {
    fn default() -> Self {
        Self::new(FolioConfig::default())
    }
}

impl DocumentService {
    pub fn new(config: FolioConfig) -> Self {
        Self {
            registry: DocumentRegistry::new(config),
        }
    }

    /// Access to the underlying registry.
    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Load a document from a local path or http(s) URL.
    pub async fn load(&self, location: &str) -> Result<LoadResult> {
        let doc = self.registry.load(location).await?;
        Ok(LoadResult {
            id: doc.id.clone(),
            page_count: doc.page_count,
        })
    }

    /// The reconstructed text of one page.
    pub async fn extract_page(&self, id: &str, page: i64) -> Result<String> {
        let doc = self.registry.get(id)?;
        let page = checked_page(&doc, page)?;
        Ok(doc.pages[(page - 1) as usize].clone())
    }

    /// The text of an inclusive page range, with one `--- Page N ---`
    /// marker per page.
    pub async fn extract_range(&self, id: &str, start: i64, end: i64) -> Result<String> {
        let doc = self.registry.get(id)?;
        if start < 1 || end < start || end > doc.page_count as i64 {
            return Err(FolioError::InvalidRange {
                start,
                end,
                page_count: doc.page_count,
            });
        }

        let mut out = String::new();
        for page in start..=end {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&format!("--- Page {} ---\n", page));
            out.push_str(&doc.pages[(page - 1) as usize]);
        }
        Ok(out)
    }

    /// Search the document's cached text.
    pub async fn search(
        &self,
        id: &str,
        query: &str,
        case_sensitive: bool,
        use_regex: bool,
    ) -> Result<Vec<SearchMatch>> {
        let doc = self.registry.get(id)?;
        crate::search::search_pages(&doc.pages, query, case_sensitive, use_regex)
    }

    /// Full record minus page bodies.
    pub async fn info(&self, id: &str) -> Result<DocumentInfo> {
        self.registry.info(id)
    }

    /// Summaries of everything currently loaded.
    pub async fn list_loaded(&self) -> Vec<DocumentSummary> {
        self.registry.list()
    }

    /// The outline rendered as indented text, or a sentinel line when the
    /// document has none.
    pub async fn extract_outline(&self, id: &str) -> Result<String> {
        let doc = self.registry.get(id)?;
        Ok(match &doc.outline {
            Some(items) => pdf::format_outline(items),
            None => pdf::NO_OUTLINE_TEXT.to_string(),
        })
    }

    /// Describe embedded images on the selected pages (all pages when
    /// `pages` is absent), without payloads.
    pub async fn list_images(&self, id: &str, pages: Option<&[i64]>) -> Result<Vec<ImageInfo>> {
        let doc = self.registry.get(id)?;
        let object_doc = reopen(&doc)?;
        let page_ids = object_doc.get_pages();

        let mut infos = Vec::new();
        for page in select_pages(pages, doc.page_count) {
            let Some(&page_id) = page_ids.get(&page) else {
                continue;
            };
            match pdf::list_page_images(&object_doc, page_id, page) {
                Ok(mut page_infos) => infos.append(&mut page_infos),
                Err(e) => tracing::warn!("Skipping image listing for page {}: {}", page, e),
            }
        }
        Ok(infos)
    }

    /// Extract embedded images from the selected pages.
    ///
    /// A page that yields no embedded images falls back to a whole-page
    /// rasterization at `dpi` (as index 0) so callers always receive
    /// something visually representative; a `dpi` of 0 disables the
    /// fallback and returns only embedded images.
    pub async fn extract_images(
        &self,
        id: &str,
        pages: Option<&[i64]>,
        dpi: f32,
    ) -> Result<Vec<PageImage>> {
        let doc = self.registry.get(id)?;
        let object_doc = reopen(&doc)?;
        let page_ids = object_doc.get_pages();

        let mut images = Vec::new();
        for page in select_pages(pages, doc.page_count) {
            let Some(&page_id) = page_ids.get(&page) else {
                continue;
            };

            let mut page_images = match pdf::extract_page_images(&object_doc, page_id, page) {
                Ok(images) => images,
                Err(e) => {
                    tracing::warn!("Skipping image extraction for page {}: {}", page, e);
                    continue;
                }
            };

            if page_images.is_empty() && dpi > 0.0 {
                match pdf::render_page(&doc.bytes, page, dpi, RenderFormat::Png) {
                    Ok(rendered) => page_images.push(PageImage {
                        page,
                        index: 0,
                        width: rendered.width,
                        height: rendered.height,
                        format: crate::types::ImageFormat::Png,
                        data: rendered.data,
                    }),
                    Err(e) => {
                        tracing::warn!("Page {} fallback rasterization failed: {}", page, e);
                    }
                }
            }

            images.append(&mut page_images);
        }
        Ok(images)
    }

    /// Extract one embedded image by page and paint-order index.
    pub async fn extract_image(&self, id: &str, page: i64, index: u32) -> Result<PageImage> {
        let doc = self.registry.get(id)?;
        let page = checked_page(&doc, page)?;
        let object_doc = reopen(&doc)?;

        let page_id = *object_doc
            .get_pages()
            .get(&page)
            .ok_or(FolioError::InvalidPageNumber {
                page: page as i64,
                page_count: doc.page_count,
            })?;

        pdf::extract_page_images(&object_doc, page_id, page)?
            .into_iter()
            .find(|image| image.index == index)
            .ok_or_else(|| {
                FolioError::NotFound(format!("image {} on page {} of '{}'", index, page, id))
            })
    }

    /// Rasterize one page. `dpi` defaults from configuration (96 unless
    /// overridden).
    pub async fn render_page(
        &self,
        id: &str,
        page: i64,
        dpi: Option<f32>,
        format: RenderFormat,
    ) -> Result<RenderedPage> {
        let doc = self.registry.get(id)?;
        let page = checked_page(&doc, page)?;
        let dpi = dpi.unwrap_or(self.registry.config().render.default_dpi);

        Ok(pdf::render_page(&doc.bytes, page, dpi, format)?)
    }

    /// Rasterize a batch of pages (all pages when `pages` is absent).
    ///
    /// Out-of-range or non-positive entries in an explicit list are
    /// silently dropped; a page that fails to render is logged and omitted
    /// rather than failing the batch.
    pub async fn render_pages(
        &self,
        id: &str,
        pages: Option<&[i64]>,
        dpi: Option<f32>,
        format: RenderFormat,
    ) -> Result<Vec<RenderedPage>> {
        let doc = self.registry.get(id)?;
        let dpi = dpi.unwrap_or(self.registry.config().render.default_dpi);

        let mut rendered = Vec::new();
        for page in select_pages(pages, doc.page_count) {
            match pdf::render_page(&doc.bytes, page, dpi, format) {
                Ok(result) => rendered.push(result),
                Err(e) => tracing::warn!("Skipping page {} in batch render: {}", page, e),
            }
        }
        Ok(rendered)
    }
}

/// Validate a 1-based page number against a loaded document.
fn checked_page(doc: &LoadedDocument, page: i64) -> Result<u32> {
    if page < 1 || page > doc.page_count as i64 {
        return Err(FolioError::InvalidPageNumber {
            page,
            page_count: doc.page_count,
        });
    }
    Ok(page as u32)
}

/// Resolve an optional explicit page list against the page count.
///
/// `None` means all pages; explicit entries outside `1..=page_count` are
/// silently dropped, preserving the caller's order.
fn select_pages(pages: Option<&[i64]>, page_count: usize) -> Vec<u32> {
    match pages {
        None => (1..=page_count as u32).collect(),
        Some(list) => list
            .iter()
            .filter(|&&p| p >= 1 && p <= page_count as i64)
            .map(|&p| p as u32)
            .collect(),
    }
}

/// Re-open the object layer from the stored source snapshot.
///
/// Image and render operations hold no persistent document handle; each
/// call re-parses the bytes fetched at load time.
fn reopen(doc: &Arc<LoadedDocument>) -> Result<lopdf::Document> {
    lopdf::Document::load_mem(&doc.bytes)
        .map_err(|e| FolioError::parse(format!("Cannot re-open document '{}': {}", doc.id, e)))
}
