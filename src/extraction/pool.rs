//! Long-lived worker pool for page-level decoding.
//!
//! Architecture: a fixed number of worker tasks pull [`PageJob`]s from one
//! bounded queue. Each job opens the document on its own, decodes a single
//! page on the blocking thread pool and answers through a oneshot channel,
//! so jobs from different documents can share the same workers. Callers
//! reassemble answers by page index, never by completion order.
//!
//! The pool is created once and reused by every extraction; it is closed
//! with [`PagePool::shutdown`], which lets queued and in-flight jobs finish.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{ExtractionError, PageSet};
use crate::engines::{EngineError, PdfEngine};

/// Text decoded from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub index: usize,
    pub text: String,
}

/// A single-page decode job submitted to the pool.
pub struct PageJob {
    pub engine: Arc<dyn PdfEngine>,
    pub path: Arc<PathBuf>,
    pub index: usize,
    pub result_tx: oneshot::Sender<Result<ExtractedPage, EngineError>>,
}

/// A bounded set of workers decoding pages in parallel.
///
/// Submit jobs via [`submit()`](PagePool::submit) and receive results through
/// the returned oneshot receiver, or hand over a whole [`PageSet`] with
/// [`extract_pages()`](PagePool::extract_pages).
pub struct PagePool {
    job_tx: async_channel::Sender<PageJob>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
}

impl std::fmt::Debug for PagePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagePool")
            .field("size", &self.size)
            .field("closed", &self.job_tx.is_closed())
            .finish()
    }
}

impl PagePool {
    /// Create a pool with `size` workers. Must be called inside a Tokio runtime.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (job_tx, job_rx) = async_channel::bounded::<PageJob>(size);

        let workers = (0..size)
            .map(|worker| tokio::spawn(worker_loop(worker, job_rx.clone())))
            .collect();

        tracing::debug!("Started page pool with {} workers", size);

        Self {
            job_tx,
            workers,
            size,
        }
    }

    /// Number of workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the pool still accepts jobs
    pub fn is_open(&self) -> bool {
        !self.job_tx.is_closed()
    }

    /// Queue one page for decoding. Waits while the queue is full.
    pub async fn submit(
        &self,
        engine: Arc<dyn PdfEngine>,
        path: Arc<PathBuf>,
        index: usize,
    ) -> Result<oneshot::Receiver<Result<ExtractedPage, EngineError>>, ExtractionError> {
        let (result_tx, result_rx) = oneshot::channel();
        let job = PageJob {
            engine,
            path,
            index,
            result_tx,
        };
        self.job_tx
            .send(job)
            .await
            .map_err(|_| ExtractionError::PoolClosed)?;
        Ok(result_rx)
    }

    /// Decode every page of `pages` on the pool, one job per page.
    ///
    /// Results come back sorted by page index regardless of which worker
    /// finished first. Any failed page fails the whole call.
    pub async fn extract_pages(
        &self,
        engine: Arc<dyn PdfEngine>,
        path: &Path,
        pages: &PageSet,
    ) -> Result<Vec<ExtractedPage>, ExtractionError> {
        let path = Arc::new(path.to_path_buf());

        // Submit and collect concurrently so a full queue cannot stall the caller
        let receivers = join_all(
            pages
                .iter()
                .map(|index| self.submit(Arc::clone(&engine), Arc::clone(&path), index)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        let mut extracted = Vec::with_capacity(receivers.len());
        for result in join_all(receivers).await {
            let page = result.map_err(|_| ExtractionError::WorkerLost)??;
            extracted.push(page);
        }

        extracted.sort_by_key(|page| page.index);
        Ok(extracted)
    }

    /// Close the pool and wait for queued and in-flight jobs to finish.
    pub async fn shutdown(self) {
        self.job_tx.close();
        for worker in self.workers {
            let _ = worker.await;
        }
        tracing::debug!("Page pool shut down");
    }
}

async fn worker_loop(worker: usize, rx: async_channel::Receiver<PageJob>) {
    while let Ok(job) = rx.recv().await {
        let PageJob {
            engine,
            path,
            index,
            result_tx,
        } = job;

        tracing::debug!(worker, page = index, file = %path.display(), "processing page");

        let result = tokio::task::spawn_blocking(move || decode_page(engine.as_ref(), &path, index))
            .await
            .unwrap_or_else(|e| Err(EngineError::Panicked(e.to_string())));

        // The caller may have given up on this document
        let _ = result_tx.send(result);
    }
}

/// Open the document independently and decode one page
fn decode_page(
    engine: &dyn PdfEngine,
    path: &Path,
    index: usize,
) -> Result<ExtractedPage, EngineError> {
    let document = engine.open(path)?;
    let text = document.page_text(index)?;
    Ok(ExtractedPage { index, text })
}
