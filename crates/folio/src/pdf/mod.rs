//! PDF document access layer.
//!
//! This module is the crate's boundary to its document collaborators:
//! `lopdf` for object-level access (outline, named destinations, content
//! operators, image XObjects, info dictionary), `pdfium-render` for
//! positioned text runs and page painting, and the `image` crate as the
//! raster encode surface.

mod bindings;
pub mod error;
pub mod images;
pub mod metadata;
mod object;
pub mod outline;
pub mod rendering;
pub mod text;

pub use error::PdfError;
pub use images::{extract_page_images, list_page_images};
pub use metadata::extract_metadata;
pub use outline::{extract_outline, format_outline, NO_OUTLINE_TEXT};
pub use rendering::{render_page, scaled_dimensions};
pub use text::{extract_page_texts, reconstruct_page_text, TextRun};
