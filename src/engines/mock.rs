//! Mock engine for testing purposes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{check_page, EngineError, PdfDocument, PdfEngine};

/// A page served by the mock engine
#[derive(Debug, Clone)]
pub enum MockPage {
    /// Decodes to the given text
    Text(String),
    /// Decodes to the given text after sleeping
    Slow(String, Duration),
    /// Fails to decode
    Broken(String),
}

/// An engine that serves predefined pages keyed by path.
///
/// Paths that were never registered fail to open, which stands in for a
/// corrupt or missing file, unless a fallback document is set.
#[derive(Debug, Default)]
pub struct MockEngine {
    documents: Mutex<HashMap<PathBuf, Arc<Vec<MockPage>>>>,
    fallback: Mutex<Option<Arc<Vec<MockPage>>>>,
    opened: Mutex<Vec<PathBuf>>,
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document made of plain text pages.
    pub fn insert_text<S: Into<String>>(&self, path: impl Into<PathBuf>, pages: Vec<S>) {
        self.insert(path, pages.into_iter().map(|p| MockPage::Text(p.into())).collect());
    }

    /// Register a document.
    pub fn insert(&self, path: impl Into<PathBuf>, pages: Vec<MockPage>) {
        let mut guard = self.documents.lock().unwrap();
        guard.insert(path.into(), Arc::new(pages));
    }

    /// Serve `pages` for every path that was not registered.
    ///
    /// Useful when the path is only known at run time, like a download.
    pub fn set_fallback(&self, pages: Vec<MockPage>) {
        *self.fallback.lock().unwrap() = Some(Arc::new(pages));
    }

    /// How many times a document was opened.
    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Every path passed to `open`, in call order.
    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl PdfEngine for MockEngine {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Engine"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, EngineError> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        let pages = self
            .documents
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .or_else(|| self.fallback.lock().unwrap().clone());
        match pages {
            Some(pages) => Ok(Box::new(MockDocument { pages })),
            None => Err(EngineError::Open(format!(
                "File not found: {}",
                path.display()
            ))),
        }
    }
}

struct MockDocument {
    pages: Arc<Vec<MockPage>>,
}

impl PdfDocument for MockDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        check_page(index, self.pages.len())?;
        match &self.pages[index] {
            MockPage::Text(text) => Ok(text.clone()),
            MockPage::Slow(text, delay) => {
                std::thread::sleep(*delay);
                Ok(text.clone())
            }
            MockPage::Broken(message) => Err(EngineError::decode(index, message)),
        }
    }
}
