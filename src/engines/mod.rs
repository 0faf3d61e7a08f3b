//! Interchangeable PDF text engines.
//!
//! This module defines the [`PdfEngine`] trait that every decoding backend
//! implements. An engine opens a document into a [`PdfDocument`], which
//! reports its page count and decodes one page at a time. The extraction
//! layer only talks to these two traits, so backends can be swapped through
//! configuration without touching callers.
//!
//! # Available Engines
//!
//! - `pdf-extract` - [`PdfExtractEngine`], per-page output of the pdf-extract crate
//! - `lopdf` - [`LopdfEngine`], lopdf's built-in per-page text extraction
//! - `layout` - [`LayoutEngine`], content-stream walk with spans sorted by position
//!
//! [`MockEngine`] serves in-memory pages and is meant for tests.
//!
//! # Implementing a New Engine
//!
//! 1. Create a struct that implements `PdfEngine`
//! 2. Return a `PdfDocument` from `open` that decodes pages independently
//! 3. Add a variant to [`EngineKind`] so it can be selected from configuration

mod layout;
mod lopdf_text;
mod pdf_extract_text;

pub mod mock;

pub use layout::LayoutEngine;
pub use lopdf_text::LopdfEngine;
pub use mock::MockEngine;
pub use pdf_extract_text::PdfExtractEngine;

use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// A PDF decoding backend.
///
/// Engines must be deterministic: decoding the same page of the same file
/// twice yields the same text.
pub trait PdfEngine: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this engine (used in configuration, e.g. "lopdf")
    fn id(&self) -> &str;

    /// Human-readable name of this engine
    fn name(&self) -> &str;

    /// Open a document for page-level decoding
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, EngineError>;
}

/// An opened document.
pub trait PdfDocument: Send {
    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Decode the text of the page at a zero-based index
    fn page_text(&self, index: usize) -> Result<String, EngineError>;
}

/// Errors that can occur while decoding a document
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The document could not be loaded at all
    #[error("Failed to open document: {0}")]
    Open(String),

    /// A single page could not be decoded
    #[error("Failed to decode page {page}: {message}")]
    Decode { page: usize, message: String },

    /// The requested page does not exist
    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    /// The underlying decoder panicked on malformed input
    #[error("Decoder panicked: {0}")]
    Panicked(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn decode(page: usize, err: impl std::fmt::Display) -> Self {
        EngineError::Decode {
            page,
            message: err.to_string(),
        }
    }
}

/// Selects one of the built-in engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    #[default]
    PdfExtract,
    Lopdf,
    Layout,
}

impl EngineKind {
    /// All built-in engines
    pub const ALL: [EngineKind; 3] = [
        EngineKind::PdfExtract,
        EngineKind::Lopdf,
        EngineKind::Layout,
    ];

    /// Returns the engine identifier (for configuration)
    pub fn id(&self) -> &'static str {
        match self {
            EngineKind::PdfExtract => "pdf-extract",
            EngineKind::Lopdf => "lopdf",
            EngineKind::Layout => "layout",
        }
    }

    /// Instantiate the engine
    pub fn engine(&self) -> Arc<dyn PdfEngine> {
        match self {
            EngineKind::PdfExtract => Arc::new(PdfExtractEngine::new()),
            EngineKind::Lopdf => Arc::new(LopdfEngine::new()),
            EngineKind::Layout => Arc::new(LayoutEngine::new()),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| format!("unknown engine '{}'", s))
    }
}

/// Run a decoder call, converting a panic into [`EngineError::Panicked`].
///
/// Some decoders panic on malformed input instead of returning errors.
pub(crate) fn guard_panics<T, F>(engine: &str, f: F) -> Result<T, EngineError>
where
    F: FnOnce() -> Result<T, EngineError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!("{} decoder panicked: {}", engine, message);
            Err(EngineError::Panicked(format!("{}: {}", engine, message)))
        }
    }
}

/// Check a zero-based page index against a page count
pub(crate) fn check_page(page: usize, count: usize) -> Result<(), EngineError> {
    if page >= count {
        return Err(EngineError::PageOutOfRange { page, count });
    }
    Ok(())
}
