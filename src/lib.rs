//! # Scholar Digest
//!
//! Harvests links to academic PDF documents from search-results pages and
//! distils each document into a [`Summary`]: keywords, abstract, future work
//! and conclusions, with "N/A" for anything that could not be found.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Summary, CandidateLink, ArticleRecord)
//! - [`engines`]: Interchangeable PDF text decoders behind the [`PdfEngine`] trait
//! - [`extraction`]: Page selection, the worker pool and ordered reassembly
//! - [`sections`]: Ordered heading/boundary patterns for each summary section
//! - [`summarizer`]: Download, extract, structure and clean up one document
//! - [`harvest`]: Candidate links from results pages
//! - [`utils`]: HTTP client and retry helpers
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output for the command-line tool

pub mod config;
pub mod engines;
pub mod extraction;
pub mod harvest;
pub mod models;
pub mod sections;
pub mod summarizer;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use engines::{EngineKind, PdfEngine};
pub use extraction::{PagePool, PageStrategy};
pub use models::{ArticleRecord, CandidateLink, Summary, NOT_AVAILABLE};
pub use summarizer::{DocumentHandle, Summarizer, SummarizerSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
