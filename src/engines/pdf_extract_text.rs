//! Engine backed by the pdf-extract crate.
//!
//! The document structure is loaded once on open; each page is rendered to
//! plain text on demand through pdf-extract's per-page output, so only the
//! selected pages pay the decoding cost. pdf-extract can panic on malformed
//! input; those panics are converted into [`EngineError::Panicked`].

use lopdf::Document;
use pdf_extract::{output_doc_page, PlainTextOutput};
use std::path::Path;

use super::{check_page, guard_panics, EngineError, PdfDocument, PdfEngine};

const ENGINE_ID: &str = "pdf-extract";

/// pdf-extract based engine
#[derive(Debug, Clone, Default)]
pub struct PdfExtractEngine;

impl PdfExtractEngine {
    pub fn new() -> Self {
        Self
    }

    /// Load an in-memory PDF for page-level decoding
    pub fn load_mem(bytes: &[u8]) -> Result<Box<dyn PdfDocument>, EngineError> {
        let doc = guard_panics(ENGINE_ID, || {
            Document::load_mem(bytes).map_err(|e| EngineError::Open(e.to_string()))
        })?;
        Ok(Box::new(PdfExtractDocument::new(decrypt(doc)?)))
    }
}

/// Open documents protected only by an empty user password
fn decrypt(mut doc: Document) -> Result<Document, EngineError> {
    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|e| EngineError::Open(format!("Encrypted document: {}", e)))?;
    }
    Ok(doc)
}

impl PdfEngine for PdfExtractEngine {
    fn id(&self) -> &str {
        ENGINE_ID
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, EngineError> {
        if !path.is_file() {
            return Err(EngineError::Open(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let doc = guard_panics(ENGINE_ID, || {
            Document::load(path).map_err(|e| EngineError::Open(e.to_string()))
        })?;
        Ok(Box::new(PdfExtractDocument::new(decrypt(doc)?)))
    }
}

struct PdfExtractDocument {
    doc: Document,
    page_numbers: Vec<u32>,
}

impl PdfExtractDocument {
    fn new(doc: Document) -> Self {
        // 1-based, in document order
        let page_numbers = doc.get_pages().keys().copied().collect();
        Self { doc, page_numbers }
    }
}

impl PdfDocument for PdfExtractDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        check_page(index, self.page_numbers.len())?;
        let page_number = self.page_numbers[index];

        guard_panics(ENGINE_ID, || {
            let mut text = String::new();
            {
                let mut output = PlainTextOutput::new(&mut text);
                output_doc_page(&self.doc, &mut output, page_number)
                    .map_err(|e| EngineError::decode(index, e))?;
            }
            if text.trim().is_empty() {
                // Scanned or image-only pages decode to nothing
                tracing::debug!("Extracted empty text from page {}", page_number);
            }
            Ok(text)
        })
    }
}
