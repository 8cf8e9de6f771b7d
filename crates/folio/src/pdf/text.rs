//! Per-page text reconstruction from positioned runs.
//!
//! Pdfium yields page text as individual characters with bounds in page
//! coordinates (bottom-left origin). Characters sharing a baseline are
//! grouped into runs, and runs are then joined back into line-structured
//! text: a vertical jump larger than [`LINE_BREAK_THRESHOLD`] between
//! consecutive runs becomes a line break, anything smaller concatenates.
//!
//! This is a heuristic reconstruction, not layout analysis: sub-pixel
//! jitter is merged, multi-column layouts are read in run order.

use super::bindings::bind_pdfium;
use super::error::{PdfError, Result};
use pdfium_render::prelude::*;

/// Vertical distance (in PDF units) above which two runs are considered
/// separate lines.
const LINE_BREAK_THRESHOLD: f32 = 1.0;

/// Vertical distance within which consecutive characters share a run.
const RUN_Y_EPSILON: f32 = 0.5;

/// A horizontal span of text with its vertical offset in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub y: f32,
}

/// Join positioned runs into newline-delimited page text.
pub fn reconstruct_page_text(runs: &[TextRun]) -> String {
    let mut out = String::new();
    let mut last_y: Option<f32> = None;

    for run in runs {
        if let Some(last) = last_y {
            if (last - run.y).abs() > LINE_BREAK_THRESHOLD {
                out.push('\n');
            }
        }
        out.push_str(&run.text);
        last_y = Some(run.y);
    }

    out
}

/// Extract the text of every page of a document.
///
/// Returns exactly `page_count` entries. A page whose runs cannot be read
/// degrades to an empty string; only a failure to open the document at all
/// is an error (and the caller degrades that to all-empty pages).
pub fn extract_page_texts(pdf_bytes: &[u8], page_count: usize) -> Result<Vec<String>> {
    let bindings = bind_pdfium(PdfError::TextExtractionFailed, "text extraction")?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(|e| PdfError::InvalidPdf(e.to_string()))?;

    let mut pages = Vec::with_capacity(page_count);
    for (page_idx, page) in document.pages().iter().enumerate() {
        match collect_runs(&page) {
            Ok(runs) => pages.push(reconstruct_page_text(&runs)),
            Err(e) => {
                tracing::debug!("Text extraction failed for page {}: {}", page_idx + 1, e);
                pages.push(String::new());
            }
        }
    }

    // The text layer and the object layer can disagree on page count for
    // damaged files; the object layer's count is authoritative.
    pages.resize(page_count, String::new());
    Ok(pages)
}

/// Collect baseline runs from a page, in content order.
fn collect_runs(page: &PdfPage) -> Result<Vec<TextRun>> {
    let text = page
        .text()
        .map_err(|e| PdfError::TextExtractionFailed(format!("Failed to get page text: {}", e)))?;

    let mut runs: Vec<TextRun> = Vec::new();
    let mut current = String::new();
    let mut current_y: Option<f32> = None;

    for pdf_char in text.chars().iter() {
        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };
        // Break/control characters are re-derived from positions below.
        if ch == '\r' || ch == '\n' {
            continue;
        }

        let Ok(bounds) = pdf_char.loose_bounds() else {
            continue;
        };
        let y = bounds.bottom().value;

        match current_y {
            Some(last) if (last - y).abs() <= RUN_Y_EPSILON => current.push(ch),
            Some(last) => {
                runs.push(TextRun {
                    text: std::mem::take(&mut current),
                    y: last,
                });
                current.push(ch);
                current_y = Some(y);
            }
            None => {
                current.push(ch);
                current_y = Some(y);
            }
        }
    }

    if let Some(y) = current_y {
        if !current.is_empty() {
            runs.push(TextRun { text: current, y });
        }
    }

    Ok(runs)
}
