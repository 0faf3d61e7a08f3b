//! Document summarization: acquire, extract, structure, release.
//!
//! [`Summarizer`] owns the long-lived [`PagePool`] and the HTTP clients. Its
//! serializable state lives in [`SummarizerSettings`]; the pool is never part
//! of it and is rebuilt by [`Summarizer::new`] from a deserialized snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

use crate::config::{Config, DownloadConfig, ExtractionConfig, HarvestConfig};
use crate::engines::PdfEngine;
use crate::extraction::{extract_document, ExtractOptions, PagePool};
use crate::harvest::{harvest_links, search_url, RESULTS_PER_PAGE};
use crate::models::{ArticleRecord, ArticleRecordBuilder, CandidateLink, Origin, Summary};
use crate::sections::summarize_text;
use crate::utils::{with_retry, FetchError, HttpClient};

/// A local copy of a document for the duration of one summarize call.
///
/// Downloaded copies are owned and deleted when the handle is dropped,
/// whichever way the call exits. Caller-supplied paths are never deleted.
#[derive(Debug)]
pub struct DocumentHandle {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl DocumentHandle {
    /// Take ownership of a downloaded file
    pub fn owned(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
        }
    }

    /// Refer to a file the caller keeps ownership of
    pub fn borrowed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
        }
    }

    /// Whether dropping the handle deletes the file
    pub fn is_owned(&self) -> bool {
        self.temp.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            match temp.close() {
                Ok(()) => tracing::debug!("File {} successfully deleted", self.path.display()),
                Err(e) => tracing::error!("Failed to delete file {}: {}", self.path.display(), e),
            }
        }
    }
}

/// Serializable summarizer state. Holds no pool or client handles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarizerSettings {
    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub downloads: DownloadConfig,

    #[serde(default)]
    pub harvest: HarvestConfig,
}

impl From<&Config> for SummarizerSettings {
    fn from(config: &Config) -> Self {
        Self {
            extraction: config.extraction.clone(),
            downloads: config.downloads.clone(),
            harvest: config.harvest.clone(),
        }
    }
}

/// Turns document URLs into [`Summary`] values.
pub struct Summarizer {
    settings: SummarizerSettings,
    engine: Arc<dyn PdfEngine>,
    pool: PagePool,
    downloader: HttpClient,
    harvester: HttpClient,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field("engine", &self.engine.id())
            .field("pool", &self.pool)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Summarizer {
    /// Build a summarizer with the configured engine and start its pool.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(settings: SummarizerSettings) -> Result<Self, FetchError> {
        let engine = settings.extraction.engine.engine();
        Self::with_engine(settings, engine)
    }

    /// Build a summarizer that decodes with `engine` instead of the configured one
    pub fn with_engine(
        settings: SummarizerSettings,
        engine: Arc<dyn PdfEngine>,
    ) -> Result<Self, FetchError> {
        let downloader = HttpClient::with_options(
            &settings.downloads.user_agent,
            settings.downloads.timeout(),
        )?;
        let harvester =
            HttpClient::with_options(&settings.harvest.user_agent, settings.harvest.timeout())?;
        let pool = PagePool::new(settings.extraction.pool_size);

        tracing::info!(
            "Summarizer ready: engine={}, parallel={}, pool_size={}",
            engine.id(),
            settings.extraction.parallel,
            pool.size()
        );

        Ok(Self {
            settings,
            engine,
            pool,
            downloader,
            harvester,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(SummarizerSettings::from(config))
    }

    /// Snapshot of the serializable state
    pub fn settings(&self) -> &SummarizerSettings {
        &self.settings
    }

    pub fn engine(&self) -> &dyn PdfEngine {
        self.engine.as_ref()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Summarize a document. Never fails: every problem yields "N/A" fields.
    ///
    /// With `should_download` the URL is fetched into a temporary file that
    /// is removed before returning; otherwise it is read as a local path (or
    /// `file://` URL) owned by the caller.
    pub async fn summarize(&self, url: &str, should_download: bool, max_pages: usize) -> Summary {
        self.summarize_document(url, should_download, max_pages)
            .await
            .unwrap_or_default()
    }

    /// Like [`summarize`](Self::summarize), but `None` when the document
    /// definitely does not exist (not an http URL, 404 or 410).
    pub async fn summarize_document(
        &self,
        url: &str,
        should_download: bool,
        max_pages: usize,
    ) -> Option<Summary> {
        let handle = match self.acquire(url, should_download).await {
            Ok(handle) => handle,
            Err(e) if e.is_terminal() => {
                tracing::warn!("No summary for {}: {}", url, e);
                return None;
            }
            Err(e) => {
                tracing::error!("Could not download {}: {}", url, e);
                return Some(Summary::default());
            }
        };

        let options = ExtractOptions {
            max_pages,
            ..self.settings.extraction.options()
        };
        let engine = Arc::clone(&self.engine);
        let text = extract_document(engine, handle.path(), &options, &self.pool).await;
        drop(handle);

        let summary = match text {
            Some(text) => summarize_text(&text),
            None => Summary::default(),
        };
        tracing::info!(
            "Summarized {} ({} of 4 sections found)",
            url,
            summary.extracted_fields()
        );
        Some(summary)
    }

    async fn acquire(
        &self,
        url: &str,
        should_download: bool,
    ) -> Result<DocumentHandle, FetchError> {
        if !should_download {
            return Ok(DocumentHandle::borrowed(local_path(url)));
        }

        let downloads = &self.settings.downloads;
        let temp = with_retry(downloads.retry(), || {
            self.downloader
                .download_to_temp(url, downloads.temp_dir.as_deref(), downloads.max_bytes())
        })
        .await?;
        Ok(DocumentHandle::owned(temp))
    }

    /// Summarize harvested links one after another into article records.
    ///
    /// Links whose document does not exist are skipped. Stops once
    /// `max_results` records were produced.
    pub async fn digest<S: AsRef<str>>(
        &self,
        links: &[CandidateLink],
        search_keywords: &[S],
        max_results: usize,
    ) -> Vec<ArticleRecord> {
        let mut records = Vec::new();

        for link in links {
            if records.len() >= max_results {
                break;
            }

            let Some(summary) = self
                .summarize_document(&link.url, true, self.settings.extraction.max_pages)
                .await
            else {
                tracing::warn!("Ignoring this url {} because it is not found", link.url);
                continue;
            };

            records.push(
                ArticleRecordBuilder::from_link(Origin::GoogleScholar, link)
                    .search_keywords(search_keywords)
                    .summary(summary)
                    .build(),
            );
        }

        records
    }

    /// Page through search results for `keywords` until `max_results`
    /// records were built or a page brings no new links.
    pub async fn search<S: AsRef<str>>(
        &self,
        keywords: &[S],
        max_results: usize,
    ) -> Vec<ArticleRecord> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut start = 0;

        while records.len() < max_results {
            let url = search_url(&self.settings.harvest.search_url, keywords, start);
            tracing::info!("Searching for results in page: {}", start / RESULTS_PER_PAGE);

            let links: Vec<CandidateLink> =
                harvest_links(&self.harvester, &url, self.settings.harvest.retry())
                    .await
                    .into_iter()
                    .filter(|link| seen.insert(link.url.clone()))
                    .collect();
            if links.is_empty() {
                tracing::info!("Search engine returned no new results for query {}", url);
                break;
            }

            let remaining = max_results - records.len();
            records.extend(self.digest(&links, keywords, remaining).await);
            start += RESULTS_PER_PAGE;
        }

        records
    }

    /// Harvest candidate links from a results page
    pub async fn harvest(&self, url: &str) -> Vec<CandidateLink> {
        harvest_links(&self.harvester, url, self.settings.harvest.retry()).await
    }

    /// Close the pool, letting in-flight page jobs finish
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}

/// Local path for a caller-owned document: a plain path or a `file://` URL
fn local_path(location: &str) -> PathBuf {
    url::Url::parse(location)
        .ok()
        .filter(|parsed| parsed.scheme() == "file")
        .and_then(|parsed| parsed.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::{MockEngine, MockPage};
    use crate::extraction::PageStrategy;
    use crate::models::NOT_AVAILABLE;

    const FIRST_PAGE: &str = "Title\n\nAbstract\nThis paper studies X.\n\nKeywords: a, b, c\n\n";
    const LAST_PAGE: &str = "5 Future Work\nMore data.\n\n6 Conclusions\nIt works.\n\nReferences\n[1] A.\n";

    fn settings(temp_dir: &Path) -> SummarizerSettings {
        let mut settings = SummarizerSettings::default();
        settings.extraction.pool_size = 2;
        settings.downloads.temp_dir = Some(temp_dir.to_path_buf());
        settings.downloads.max_attempts = 1;
        settings.harvest.max_attempts = 1;
        settings
    }

    fn paper_engine() -> Arc<MockEngine> {
        let engine = Arc::new(MockEngine::new());
        engine.set_fallback(vec![
            MockPage::Text(FIRST_PAGE.into()),
            MockPage::Text("Body.\n".into()),
            MockPage::Text(LAST_PAGE.into()),
        ]);
        engine
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_borrowed_handle_is_not_deleted() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let handle = DocumentHandle::borrowed(file.path());
        assert!(!handle.is_owned());
        drop(handle);
        assert!(file.path().exists());
    }

    #[test]
    fn test_owned_handle_is_deleted() {
        let temp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let path = temp.to_path_buf();
        let handle = DocumentHandle::owned(temp);
        assert!(handle.is_owned());
        assert_eq!(handle.path(), path.as_path());
        drop(handle);
        assert!(!path.exists());
    }

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/tmp/a.pdf"), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(local_path("file:///tmp/a.pdf"), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(local_path("paper.pdf"), PathBuf::from("paper.pdf"));
    }

    #[tokio::test]
    async fn test_summarize_download() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper.pdf")
            .with_status(200)
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = paper_engine();
        let summarizer = Summarizer::with_engine(settings(dir.path()), engine.clone()).unwrap();

        let summary = summarizer
            .summarize(&format!("{}/paper.pdf", server.url()), true, 20)
            .await;

        assert_eq!(summary.abstract_summary, "This paper studies X.");
        assert_eq!(summary.keywords, "a, b, c");
        assert_eq!(summary.future_work, "More data.");
        assert_eq!(summary.conclusions, "It works.");

        let opened = engine.opened_paths();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].starts_with(dir.path()));
        assert!(!opened[0].exists());
        assert!(dir_is_empty(dir.path()));

        summarizer.shutdown().await;
    }

    #[tokio::test]
    async fn test_not_found_produces_no_summary() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.pdf")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = paper_engine();
        let summarizer = Summarizer::with_engine(settings(dir.path()), engine.clone()).unwrap();
        let url = format!("{}/gone.pdf", server.url());

        assert_eq!(summarizer.summarize_document(&url, true, 20).await, None);
        assert_eq!(summarizer.summarize(&url, true, 20).await, Summary::default());
        assert_eq!(engine.open_count(), 0);
    }

    #[tokio::test]
    async fn test_ambiguous_failure_skips_decoding() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/forbidden.pdf")
            .with_status(403)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let engine = paper_engine();
        let summarizer = Summarizer::with_engine(settings(dir.path()), engine.clone()).unwrap();

        let summary = summarizer
            .summarize_document(&format!("{}/forbidden.pdf", server.url()), true, 20)
            .await;
        assert_eq!(summary, Some(Summary::default()));
        assert_eq!(engine.open_count(), 0);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_non_http_url_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let summarizer = Summarizer::with_engine(settings(dir.path()), paper_engine()).unwrap();

        assert_eq!(summarizer.summarize_document("not-a-url", true, 20).await, None);
        assert_eq!(summarizer.summarize("not-a-url", true, 20).await, Summary::default());
    }

    #[tokio::test]
    async fn test_caller_owned_path_is_kept() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let engine = Arc::new(MockEngine::new());
        engine.insert_text(file.path(), vec![FIRST_PAGE]);

        let dir = tempfile::tempdir().unwrap();
        let summarizer = Summarizer::with_engine(settings(dir.path()), engine).unwrap();
        let summary = summarizer
            .summarize(&file.path().to_string_lossy(), false, 20)
            .await;

        assert_eq!(summary.keywords, "a, b, c");
        assert!(file.path().exists());
    }

    #[tokio::test]
    async fn test_extraction_failure_still_deletes_download() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken.pdf")
            .with_status(200)
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let engine = Arc::new(MockEngine::new());
        engine.set_fallback(vec![
            MockPage::Text(FIRST_PAGE.into()),
            MockPage::Broken("bad xref".into()),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let summarizer = Summarizer::with_engine(settings(dir.path()), engine.clone()).unwrap();
        let summary = summarizer
            .summarize_document(&format!("{}/broken.pdf", server.url()), true, 20)
            .await;

        assert_eq!(summary, Some(Summary::default()));
        assert_eq!(engine.open_count(), 1);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_max_pages_limits_reading() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let engine = Arc::new(MockEngine::new());
        engine.insert_text(file.path(), vec!["Cover page\n", FIRST_PAGE]);

        let dir = tempfile::tempdir().unwrap();
        let summarizer = Summarizer::with_engine(settings(dir.path()), engine).unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert_eq!(summarizer.summarize(&path, false, 1).await.keywords, NOT_AVAILABLE);
        assert_eq!(summarizer.summarize(&path, false, 2).await.keywords, "a, b, c");
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let engine = Arc::new(MockEngine::new());
        engine.insert_text(file.path(), vec![FIRST_PAGE, "Body.\n", LAST_PAGE]);
        let path = file.path().to_string_lossy().to_string();
        let dir = tempfile::tempdir().unwrap();

        let sequential = Summarizer::with_engine(settings(dir.path()), engine.clone()).unwrap();
        let mut parallel_settings = settings(dir.path());
        parallel_settings.extraction.parallel = true;
        let parallel = Summarizer::with_engine(parallel_settings, engine).unwrap();

        let expected = sequential.summarize(&path, false, 20).await;
        assert_eq!(parallel.summarize(&path, false, 20).await, expected);
        assert_eq!(expected.conclusions, "It works.");

        parallel.shutdown().await;
        sequential.shutdown().await;
    }

    #[tokio::test]
    async fn test_portion_strategy_skips_middle_pages() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let engine = Arc::new(MockEngine::new());
        engine.insert(
            file.path(),
            vec![
                MockPage::Text(FIRST_PAGE.into()),
                MockPage::Broken("never read".into()),
                MockPage::Broken("never read".into()),
                MockPage::Text(LAST_PAGE.into()),
            ],
        );

        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.extraction.strategy = PageStrategy::portion(25, 25);
        let summarizer = Summarizer::with_engine(settings, engine).unwrap();

        let summary = summarizer
            .summarize(&file.path().to_string_lossy(), false, 20)
            .await;
        assert_eq!(summary.abstract_summary, "This paper studies X.");
        assert_eq!(summary.conclusions, "It works.");
    }

    #[tokio::test]
    async fn test_settings_snapshot_excludes_pool() {
        let dir = tempfile::tempdir().unwrap();
        let summarizer = Summarizer::with_engine(settings(dir.path()), paper_engine()).unwrap();

        let json = serde_json::to_value(summarizer.settings()).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["downloads", "extraction", "harvest"]);

        let restored: SummarizerSettings = serde_json::from_value(json).unwrap();
        assert_eq!(&restored, summarizer.settings());

        let rebuilt = Summarizer::with_engine(restored, paper_engine()).unwrap();
        assert_eq!(rebuilt.pool_size(), 2);
        rebuilt.shutdown().await;
        summarizer.shutdown().await;
    }

    #[tokio::test]
    async fn test_digest_skips_missing_and_stops_at_limit() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing.pdf")
            .with_status(404)
            .create_async()
            .await;
        let _found = server
            .mock("GET", mockito::Matcher::Regex(r"^/paper\d\.pdf$".to_string()))
            .with_status(200)
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let links = vec![
            CandidateLink::new(format!("{}/missing.pdf", server.url()), "Gone", ""),
            CandidateLink::new(format!("{}/paper1.pdf", server.url()), "One", "A Smith"),
            CandidateLink::new(format!("{}/paper2.pdf", server.url()), "Two", "B Jones"),
            CandidateLink::new(format!("{}/paper3.pdf", server.url()), "Three", ""),
        ];

        let dir = tempfile::tempdir().unwrap();
        let summarizer = Summarizer::with_engine(settings(dir.path()), paper_engine()).unwrap();
        let records = summarizer.digest(&links, &["x", "y"], 2).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "One");
        assert_eq!(records[0].authors, "A Smith");
        assert_eq!(records[0].search_keywords, "x,y");
        assert_eq!(records[0].keywords, "a, b, c");
        assert_eq!(records[0].origin, Origin::GoogleScholar);
        assert_eq!(records[1].title, "Two");
    }

    #[tokio::test]
    async fn test_search_pages_through_results() {
        let mut server = mockito::Server::new_async().await;
        let entry = |name: &str| {
            format!(
                r#"<div><div><div><div><a href="{}/{name}.pdf">[PDF]</a></div></div></div><h3 class="gs_rt"><a href="/x">{name}</a></h3><div class="gs_a">Someone</div></div>"#,
                server.url()
            )
        };
        let first_page = format!("<html><body>{}{}</body></html>", entry("one"), entry("two"));

        let _first = server
            .mock("GET", mockito::Matcher::Regex("^/scholar".to_string()))
            .match_query(mockito::Matcher::UrlEncoded("start".into(), "0".into()))
            .with_status(200)
            .with_body(first_page)
            .create_async()
            .await;
        let _second = server
            .mock("GET", mockito::Matcher::Regex("^/scholar".to_string()))
            .match_query(mockito::Matcher::UrlEncoded("start".into(), "10".into()))
            .with_status(200)
            .with_body("<html><body>no more</body></html>")
            .create_async()
            .await;
        let _papers = server
            .mock("GET", mockito::Matcher::Regex(r"\.pdf$".to_string()))
            .with_status(200)
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.harvest.search_url = format!("{}/scholar?q=", server.url());
        let summarizer = Summarizer::with_engine(settings, paper_engine()).unwrap();

        let records = summarizer.search(&["deep learning"], 5).await;
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two"]);
        assert_eq!(records[0].search_keywords, "deep learning");
    }
}
