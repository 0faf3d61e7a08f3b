//! Turning a document plus a page selection into raw text.
//!
//! Two modes produce byte-identical output for the same document and page
//! set:
//!
//! - sequential: the document is opened once and pages are decoded in index
//!   order on a blocking thread
//! - parallel: every page is an independent job on the shared [`PagePool`];
//!   results are sorted by page index before concatenation
//!
//! Decode failures are reported as [`ExtractionError`] by [`extract_text`]
//! and swallowed into `None` (after logging) by [`extract_document`], so one
//! bad document never aborts a batch.

mod pool;
mod strategy;

pub use pool::{ExtractedPage, PageJob, PagePool};
pub use strategy::{select_pages, PageSet, PageStrategy};

use std::path::Path;
use std::sync::Arc;

use crate::engines::{EngineError, PdfDocument, PdfEngine};

/// Errors that can occur while extracting a document
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The engine could not open or decode the document
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The pool was shut down before the job could be queued
    #[error("Page pool is closed")]
    PoolClosed,

    /// A worker dropped a job without answering
    #[error("Page worker stopped before returning a result")]
    WorkerLost,

    /// The blocking decode task failed
    #[error("Extraction task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ExtractionError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExtractionError::Task(err.to_string())
    }
}

/// How a document is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Never read past this many pages
    pub max_pages: usize,
    /// Which of the readable pages to decode
    pub strategy: PageStrategy,
    /// Dispatch pages to the pool instead of decoding them in one pass
    pub parallel: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_pages: 20,
            strategy: PageStrategy::All,
            parallel: false,
        }
    }
}

/// Decode `pages` of the document at `path` and concatenate them in index order.
pub async fn extract_text(
    engine: Arc<dyn PdfEngine>,
    path: &Path,
    pages: &PageSet,
    pool: &PagePool,
    parallel: bool,
) -> Result<String, ExtractionError> {
    if pages.is_empty() {
        return Ok(String::new());
    }

    if parallel {
        let extracted = pool.extract_pages(engine, path, pages).await?;
        return Ok(concat_pages(&extracted));
    }

    let path = path.to_path_buf();
    let pages = pages.clone();
    tokio::task::spawn_blocking(move || {
        let document = engine.open(&path)?;
        read_pages(document.as_ref(), &pages)
    })
    .await?
}

/// Count pages, select them, decode them; `None` on any failure.
pub async fn extract_document(
    engine: Arc<dyn PdfEngine>,
    path: &Path,
    options: &ExtractOptions,
    pool: &PagePool,
) -> Option<String> {
    match try_extract_document(Arc::clone(&engine), path, options, pool).await {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(
                "Cannot convert PDF {} into text with {}: {}",
                path.display(),
                engine.id(),
                e
            );
            None
        }
    }
}

async fn try_extract_document(
    engine: Arc<dyn PdfEngine>,
    path: &Path,
    options: &ExtractOptions,
    pool: &PagePool,
) -> Result<String, ExtractionError> {
    let owned_path = path.to_path_buf();
    let options = *options;

    if !options.parallel {
        // One open serves both the page count and the decoding
        return tokio::task::spawn_blocking(move || {
            let document = engine.open(&owned_path)?;
            let pages = select_pages(document.page_count(), options.max_pages, &options.strategy);
            tracing::debug!(
                "Reading {} of {} pages from {}",
                pages.len(),
                document.page_count(),
                owned_path.display()
            );
            read_pages(document.as_ref(), &pages)
        })
        .await?;
    }

    let counting_engine = Arc::clone(&engine);
    let total = tokio::task::spawn_blocking(move || {
        counting_engine
            .open(&owned_path)
            .map(|document| document.page_count())
    })
    .await??;

    let pages = select_pages(total, options.max_pages, &options.strategy);
    tracing::debug!(
        "Dispatching {} of {} pages from {} to the pool",
        pages.len(),
        total,
        path.display()
    );
    extract_text(engine, path, &pages, pool, true).await
}

/// Decode pages in index order from an already opened document
fn read_pages(document: &dyn PdfDocument, pages: &PageSet) -> Result<String, ExtractionError> {
    let mut merged = String::new();
    for index in pages.iter() {
        merged.push_str(&document.page_text(index)?);
    }
    Ok(merged)
}

fn concat_pages(pages: &[ExtractedPage]) -> String {
    pages.iter().map(|page| page.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::{MockEngine, MockPage};
    use std::time::Duration;

    fn paper_engine() -> Arc<MockEngine> {
        let engine = Arc::new(MockEngine::new());
        engine.insert(
            "/docs/paper.pdf",
            vec![
                MockPage::Slow("Title\n\nAbstract\nShort.\n\n".into(), Duration::from_millis(60)),
                MockPage::Text("Body one.\n".into()),
                MockPage::Slow("Body two.\n".into(), Duration::from_millis(30)),
                MockPage::Text("Conclusion\nDone.\n\nReferences\n".into()),
            ],
        );
        engine
    }

    #[tokio::test]
    async fn test_parallel_and_sequential_identical() {
        let engine = paper_engine();
        let pool = PagePool::new(4);
        let pages = PageSet::all(4);
        let path = Path::new("/docs/paper.pdf");

        let sequential = extract_text(engine.clone(), path, &pages, &pool, false)
            .await
            .unwrap();
        let parallel = extract_text(engine.clone(), path, &pages, &pool, true)
            .await
            .unwrap();

        assert_eq!(sequential, parallel);
        assert!(sequential.starts_with("Title"));
        assert!(sequential.ends_with("References\n"));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_page_set_is_empty_text() {
        let engine = Arc::new(MockEngine::new());
        let pool = PagePool::new(2);
        for parallel in [false, true] {
            let text = extract_text(
                engine.clone(),
                Path::new("/docs/unknown.pdf"),
                &PageSet::default(),
                &pool,
                parallel,
            )
            .await
            .unwrap();
            assert_eq!(text, "");
        }
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_extract_document_respects_strategy() {
        let engine = Arc::new(MockEngine::new());
        engine.insert_text("/docs/long.pdf", (0..8).map(|i| format!("[{}]", i)).collect());
        let pool = PagePool::new(2);

        for parallel in [false, true] {
            let options = ExtractOptions {
                max_pages: 8,
                strategy: PageStrategy::portion(25, 25),
                parallel,
            };
            let path = Path::new("/docs/long.pdf");
            let text = extract_document(engine.clone(), path, &options, &pool).await;
            assert_eq!(text.as_deref(), Some("[0][1][6][7]"));
        }
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_extract_document_caps_max_pages() {
        let engine = Arc::new(MockEngine::new());
        engine.insert_text("/docs/long.pdf", (0..30).map(|i| format!("[{}]", i)).collect());
        let pool = PagePool::new(2);

        let options = ExtractOptions {
            max_pages: 3,
            ..ExtractOptions::default()
        };
        let text = extract_document(engine, Path::new("/docs/long.pdf"), &options, &pool).await;
        assert_eq!(text.as_deref(), Some("[0][1][2]"));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_extract_document_failure_is_none() {
        let engine = Arc::new(MockEngine::new());
        engine.insert(
            "/docs/broken.pdf",
            vec![MockPage::Text("fine".into()), MockPage::Broken("bad xref".into())],
        );
        let pool = PagePool::new(2);

        for parallel in [false, true] {
            let options = ExtractOptions {
                parallel,
                ..ExtractOptions::default()
            };
            for path in ["/docs/broken.pdf", "/docs/missing.pdf"] {
                let text = extract_document(engine.clone(), Path::new(path), &options, &pool).await;
                assert!(text.is_none(), "{path} should not decode");
            }
        }
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_page_document_is_empty_text() {
        let engine = Arc::new(MockEngine::new());
        engine.insert("/docs/empty.pdf", Vec::new());
        let pool = PagePool::new(1);

        for parallel in [false, true] {
            let options = ExtractOptions {
                parallel,
                ..ExtractOptions::default()
            };
            let path = Path::new("/docs/empty.pdf");
            let text = extract_document(engine.clone(), path, &options, &pool).await;
            assert_eq!(text.as_deref(), Some(""));
        }
        pool.shutdown().await;
    }
}
