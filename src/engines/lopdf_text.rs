//! Engine backed by lopdf's per-page text extraction.

use lopdf::Document;
use std::path::Path;

use super::{check_page, guard_panics, EngineError, PdfDocument, PdfEngine};

const ENGINE_ID: &str = "lopdf";

/// lopdf based engine
#[derive(Debug, Clone, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for LopdfEngine {
    fn id(&self) -> &str {
        ENGINE_ID
    }

    fn name(&self) -> &str {
        "lopdf"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, EngineError> {
        let doc = guard_panics(ENGINE_ID, || {
            Document::load(path).map_err(|e| EngineError::Open(e.to_string()))
        })?;

        if doc.is_encrypted() {
            return Err(EngineError::Open(format!(
                "Encrypted document: {}",
                path.display()
            )));
        }

        // Page numbers are 1-based and keyed in order
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

        Ok(Box::new(LopdfDocument { doc, page_numbers }))
    }
}

struct LopdfDocument {
    doc: Document,
    page_numbers: Vec<u32>,
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        check_page(index, self.page_numbers.len())?;
        let page_number = self.page_numbers[index];
        guard_panics(ENGINE_ID, || {
            self.doc
                .extract_text(&[page_number])
                .map_err(|e| EngineError::decode(index, e))
        })
    }
}
