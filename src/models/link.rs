//! Document links scraped from a search-results page.

use serde::{Deserialize, Serialize};

/// A candidate document URL with the title and authors shown next to it.
///
/// Title and authors are best-effort and fall back to empty strings when the
/// surrounding page structure is missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateLink {
    pub url: String,
    pub title: String,
    pub authors: String,
}

impl CandidateLink {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        authors: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            authors: authors.into(),
        }
    }

    /// Author names as shown on the results page, split on commas
    pub fn author_list(&self) -> Vec<&str> {
        self.authors
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
