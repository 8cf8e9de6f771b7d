//! Keyed store of loaded documents.
//!
//! A document's id is a digest of its location string (not of its
//! content), so loading the same path or URL twice yields the same id,
//! and a re-load silently replaces the previous record. Records live for
//! the registry's lifetime; there is no eviction.
//!
//! Loading is synchronous-complete: the whole per-page text
//! reconstruction, metadata, and outline resolution happen before `load`
//! returns, and the record is published to readers only once fully
//! constructed. Concurrent loads for the same id are coalesced: the first
//! caller performs the work, the rest await and receive the same record.

use crate::config::FolioConfig;
use crate::error::{FolioError, Result};
use crate::pdf;
use crate::source;
use crate::types::{DocumentInfo, DocumentSummary, LoadedDocument};
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Length of a document id in hex characters (128 bits of SHA-256).
const ID_HEX_WIDTH: usize = 32;

type LoadCell = Arc<OnceCell<Arc<LoadedDocument>>>;

/// The shared store of loaded documents.
///
/// Owned by [`crate::service::DocumentService`]; there is no process-wide
/// instance.
pub struct DocumentRegistry {
    config: FolioConfig,
    documents: DashMap<String, Arc<LoadedDocument>>,
    inflight: Mutex<HashMap<String, LoadCell>>,
}

/// Deterministic id for a location string.
pub fn document_id(location: &str) -> String {
    let digest = Sha256::digest(location.as_bytes());
    hex::encode(&digest[..ID_HEX_WIDTH / 2])
}

impl DocumentRegistry {
    pub fn new(config: FolioConfig) -> Self {
        Self {
            config,
            documents: DashMap::new(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Load (or re-load) the document at `location` and publish it.
    ///
    /// Callers arriving while a load for the same id is in flight await
    /// that load and receive the same record. A call arriving after a
    /// completed load starts a fresh one and replaces the record.
    pub async fn load(&self, location: &str) -> Result<Arc<LoadedDocument>> {
        let id = document_id(location);

        let cell = {
            let mut inflight = self.inflight.lock();
            inflight
                .entry(id.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell
            .get_or_try_init(|| self.load_uncoalesced(location, &id))
            .await
            .map(Arc::clone);

        // Retire the cell so the next load call starts fresh rather than
        // observing this (now historical) result.
        {
            let mut inflight = self.inflight.lock();
            if let Some(current) = inflight.get(&id) {
                if Arc::ptr_eq(current, &cell) {
                    inflight.remove(&id);
                }
            }
        }

        let document = result?;
        self.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn load_uncoalesced(&self, location: &str, id: &str) -> Result<Arc<LoadedDocument>> {
        tracing::debug!("Loading document '{}' as {}", location, id);
        let bytes = source::fetch_bytes(location, &self.config.http).await?;

        // The object layer is the parse gate: bytes it rejects are a
        // ParseFailure regardless of what the text layer would say.
        let object_doc = lopdf::Document::load_mem(&bytes).map_err(|e| {
            FolioError::parse(format!("Cannot open document from '{}': {}", location, e))
        })?;

        let page_count = object_doc.get_pages().len();

        let pages = match pdf::extract_page_texts(&bytes, page_count) {
            Ok(pages) => pages,
            Err(e) => {
                // Text is best-effort: a document that parses but whose
                // text layer is unavailable degrades to empty pages.
                tracing::warn!("Text extraction unavailable for '{}': {}", location, e);
                vec![String::new(); page_count]
            }
        };

        let metadata = pdf::extract_metadata(&object_doc);
        let outline = pdf::extract_outline(&object_doc);

        Ok(Arc::new(LoadedDocument {
            id: id.to_string(),
            location: location.to_string(),
            bytes,
            page_count,
            pages,
            metadata,
            outline,
        }))
    }

    /// Look up a loaded document.
    pub fn get(&self, id: &str) -> Result<Arc<LoadedDocument>> {
        self.documents
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FolioError::NotFound(id.to_string()))
    }

    /// Summaries of all loaded documents, ordered by location.
    pub fn list(&self) -> Vec<DocumentSummary> {
        let mut summaries: Vec<DocumentSummary> = self
            .documents
            .iter()
            .map(|entry| {
                let doc = entry.value();
                DocumentSummary {
                    id: doc.id.clone(),
                    location: doc.location.clone(),
                    page_count: doc.page_count,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.location.cmp(&b.location));
        summaries
    }

    /// Full record minus page bodies.
    pub fn info(&self, id: &str) -> Result<DocumentInfo> {
        Ok(DocumentInfo::from(self.get(id)?.as_ref()))
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }
}
