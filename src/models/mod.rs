//! Core data models for harvested links, summaries and article records.

mod article;
mod link;
mod summary;

pub use article::{ArticleRecord, ArticleRecordBuilder, Origin};
pub use link::CandidateLink;
pub use summary::{Summary, NOT_AVAILABLE};
