//! Structured summary distilled from a paper's text.

use serde::{Deserialize, Serialize};

/// Placeholder stored in a field when nothing could be extracted for it.
pub const NOT_AVAILABLE: &str = "N/A";

/// The four sections recovered from a paper.
///
/// Every field holds either extracted text or [`NOT_AVAILABLE`]. A summary is
/// built once per document and never mutated afterwards; equality is
/// structural over all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Summary {
    /// Author keywords / index terms
    pub keywords: String,

    /// Abstract text
    pub abstract_summary: String,

    /// Future work / future directions paragraph
    pub future_work: String,

    /// Conclusions paragraph
    pub conclusions: String,
}

impl Summary {
    /// Build a summary from the four extracted sections
    pub fn new(
        keywords: impl Into<String>,
        abstract_summary: impl Into<String>,
        future_work: impl Into<String>,
        conclusions: impl Into<String>,
    ) -> Self {
        Self {
            keywords: keywords.into(),
            abstract_summary: abstract_summary.into(),
            future_work: future_work.into(),
            conclusions: conclusions.into(),
        }
    }

    /// True when no field carries extracted text
    pub fn is_empty(&self) -> bool {
        [
            &self.keywords,
            &self.abstract_summary,
            &self.future_work,
            &self.conclusions,
        ]
        .iter()
        .all(|field| field.as_str() == NOT_AVAILABLE)
    }

    /// Number of fields that were extracted
    pub fn extracted_fields(&self) -> usize {
        [
            &self.keywords,
            &self.abstract_summary,
            &self.future_work,
            &self.conclusions,
        ]
        .iter()
        .filter(|field| field.as_str() != NOT_AVAILABLE)
        .count()
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::new(NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE)
    }
}
