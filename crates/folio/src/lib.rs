//! folio: PDF document content service.
//!
//! folio gives random access to the contents of previously-loaded PDF
//! documents: per-page reconstructed text, the outline (table of
//! contents), embedded images, page rasterizations at arbitrary DPI, and
//! substring/regex search over extracted text.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use folio::{DocumentService, FolioConfig};
//!
//! # async fn example() -> folio::Result<()> {
//! let service = DocumentService::new(FolioConfig::default());
//!
//! let loaded = service.load("report.pdf").await?;
//! let text = service.extract_page(&loaded.id, 1).await?;
//! let matches = service.search(&loaded.id, "revenue", false, false).await?;
//! println!("page 1: {} chars, {} pages matched", text.len(), matches.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Registry** (`registry`): keyed store of loaded documents; ids are
//!   digests of the source location, loads are coalesced per id and
//!   published only once fully constructed.
//! - **Content model** (`pdf`): text-run layout reconstruction, outline
//!   destination resolution, image classification/decoding, and page
//!   rasterization over the `lopdf`/`pdfium-render` document layer and
//!   the `image` raster surface.
//! - **Search** (`search`): plain and regex modes with ±50-character
//!   context windows, over the registry's cached page text.
//! - **Service** (`service`): the operation surface callers talk to.
//!
//! Loading a document eagerly reconstructs all page text and the outline;
//! image extraction and rendering re-open the stored byte snapshot on each
//! call and hold no persistent document handle.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod pdf;
pub mod registry;
pub mod search;
pub mod service;
pub mod source;
pub mod types;

pub use config::FolioConfig;
pub use error::{FolioError, Result};
pub use registry::{document_id, DocumentRegistry};
pub use service::DocumentService;
pub use types::{
    DocumentInfo, DocumentSummary, ImageFormat, ImageInfo, LoadResult, LoadedDocument,
    OutlineItem, PageImage, RenderFormat, RenderedPage, SearchHit, SearchMatch,
};
