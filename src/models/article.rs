//! Article record handed to the downstream search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CandidateLink, Summary};

/// Where an article was discovered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    GoogleScholar,
    #[serde(untagged)]
    Other(String),
}

impl Origin {
    /// Returns the origin identifier stored with the record
    pub fn id(&self) -> &str {
        match self {
            Origin::GoogleScholar => "googlescholar",
            Origin::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A harvested link merged with the summary of the document behind it.
///
/// Storage and deduplication by URL belong to the consumer of these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Where the link was harvested from
    pub origin: Origin,

    /// Document URL
    pub url: String,

    /// When the record was built
    pub date: DateTime<Utc>,

    /// Search keywords that surfaced this article (comma-separated)
    pub search_keywords: String,

    /// Title shown on the results page
    pub title: String,

    /// Authors shown on the results page
    pub authors: String,

    /// Keywords extracted from the document
    pub keywords: String,

    /// Abstract extracted from the document
    pub abstract_summary: String,

    /// Future work extracted from the document
    pub future_work: String,

    /// Conclusions extracted from the document
    pub conclusions: String,
}

impl ArticleRecord {
    /// Create a record for a URL with an empty summary
    pub fn new(origin: Origin, url: impl Into<String>) -> Self {
        let summary = Summary::default();
        Self {
            origin,
            url: url.into(),
            date: Utc::now(),
            search_keywords: String::new(),
            title: String::new(),
            authors: String::new(),
            keywords: summary.keywords,
            abstract_summary: summary.abstract_summary,
            future_work: summary.future_work,
            conclusions: summary.conclusions,
        }
    }

    /// The four extracted sections as a [`Summary`]
    pub fn summary(&self) -> Summary {
        Summary::new(
            self.keywords.clone(),
            self.abstract_summary.clone(),
            self.future_work.clone(),
            self.conclusions.clone(),
        )
    }
}

/// Builder for constructing ArticleRecord objects
#[derive(Debug, Clone)]
pub struct ArticleRecordBuilder {
    record: ArticleRecord,
}

impl ArticleRecordBuilder {
    /// Create a new builder with required fields
    pub fn new(origin: Origin, url: impl Into<String>) -> Self {
        Self {
            record: ArticleRecord::new(origin, url),
        }
    }

    /// Start from a harvested link, copying its url, title and authors
    pub fn from_link(origin: Origin, link: &CandidateLink) -> Self {
        Self::new(origin, link.url.clone())
            .title(link.title.clone())
            .authors(link.authors.clone())
    }

    /// Set search keywords from a list of terms
    pub fn search_keywords<S: AsRef<str>>(mut self, keywords: &[S]) -> Self {
        self.record.search_keywords = keywords
            .iter()
            .map(|k| k.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.record.title = title.into();
        self
    }

    /// Set authors
    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.record.authors = authors.into();
        self
    }

    /// Copy the extracted sections
    pub fn summary(mut self, summary: Summary) -> Self {
        self.record.keywords = summary.keywords;
        self.record.abstract_summary = summary.abstract_summary;
        self.record.future_work = summary.future_work;
        self.record.conclusions = summary.conclusions;
        self
    }

    /// Build the ArticleRecord
    pub fn build(self) -> ArticleRecord {
        self.record
    }
}
