//! Integration tests for Scholar Digest
//!
//! These tests build small real PDFs with lopdf, serve them from a local
//! mock server and run them through the public summarize / harvest API.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use scholar_digest::engines::EngineKind;
use scholar_digest::extraction::{extract_document, ExtractOptions, PagePool, PageStrategy};
use scholar_digest::harvest::harvest_links;
use scholar_digest::utils::{HttpClient, RetryConfig};
use scholar_digest::{Summarizer, SummarizerSettings, Summary, NOT_AVAILABLE};
use std::path::Path;
use std::sync::Arc;

const FIRST_PAGE: &[&str] = &[
    "A Study of X",
    "",
    "Abstract",
    "This paper studies X.",
    "",
    "Keywords: a, b, c",
    "",
    "1 Introduction",
    "X matters.",
];

const LAST_PAGE: &[&str] = &[
    "5 Future Work",
    "We will extend it.",
    "",
    "6 Conclusions",
    "It works.",
    "",
    "References",
    "[1] A. Author.",
];

/// Build a PDF whose pages hold the given lines; an empty line leaves a gap
fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let pages: Vec<(&str, &[&str])> = pages.iter().map(|lines| ("F1", *lines)).collect();
    build_pdf_with_fonts(&pages)
}

/// Like [`build_pdf`], naming the font resource each page selects.
/// Only `F1` is defined, so any other name leaves that page undecodable.
fn build_pdf_with_fonts(pages: &[(&str, &[&str])]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for (font, lines) in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), 12.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = 760 - 14 * i as i64;
            operations.push(Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), 72.into(), y.into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn paper_pdf() -> Vec<u8> {
    build_pdf(&[FIRST_PAGE, &["Body text."], LAST_PAGE])
}

fn write_paper(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("paper.pdf");
    std::fs::write(&path, paper_pdf()).unwrap();
    path
}

fn settings(engine: EngineKind, temp_dir: &Path) -> SummarizerSettings {
    let mut settings = SummarizerSettings::default();
    settings.extraction.engine = engine;
    settings.extraction.pool_size = 2;
    settings.downloads.temp_dir = Some(temp_dir.to_path_buf());
    settings.downloads.max_attempts = 1;
    settings.harvest.max_attempts = 1;
    settings
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

fn expected_summary() -> Summary {
    Summary::new("a, b, c", "This paper studies X.", "We will extend it.", "It works.")
}

#[tokio::test]
async fn test_layout_engine_summarizes_local_file() {
    let docs = tempfile::tempdir().unwrap();
    let path = write_paper(docs.path());
    let temp = tempfile::tempdir().unwrap();

    let summarizer = Summarizer::new(settings(EngineKind::Layout, temp.path())).unwrap();
    let summary = summarizer
        .summarize(&path.to_string_lossy(), false, 20)
        .await;

    assert_eq!(summary, expected_summary());
    assert!(path.exists(), "caller-owned file must not be deleted");
    summarizer.shutdown().await;
}

#[tokio::test]
async fn test_downloaded_document_is_summarized_and_removed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/papers/x.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(paper_pdf())
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let summarizer = Summarizer::new(settings(EngineKind::Layout, temp.path())).unwrap();
    let summary = summarizer
        .summarize(&format!("{}/papers/x.pdf", server.url()), true, 20)
        .await;

    mock.assert_async().await;
    assert_eq!(summary, expected_summary());
    assert!(dir_is_empty(temp.path()));
    summarizer.shutdown().await;
}

#[tokio::test]
async fn test_parallel_and_sequential_identical_for_every_engine() {
    let docs = tempfile::tempdir().unwrap();
    let path = write_paper(docs.path());
    let pool = PagePool::new(3);

    for kind in EngineKind::ALL {
        let sequential = ExtractOptions::default();
        let parallel = ExtractOptions {
            parallel: true,
            ..ExtractOptions::default()
        };

        let a = extract_document(kind.engine(), &path, &sequential, &pool).await;
        let b = extract_document(kind.engine(), &path, &parallel, &pool).await;
        assert_eq!(a, b, "{} differs between modes", kind);
    }

    pool.shutdown().await;
}

#[tokio::test]
async fn test_unselected_broken_page_does_not_fail_document() {
    let docs = tempfile::tempdir().unwrap();
    let path = docs.path().join("broken-tail.pdf");
    let bytes = build_pdf_with_fonts(&[
        ("F1", FIRST_PAGE),
        ("F1", &["Body text."]),
        ("F9", &["Undefined font."]),
    ]);
    std::fs::write(&path, bytes).unwrap();
    let pool = PagePool::new(2);

    for kind in EngineKind::ALL {
        for parallel in [false, true] {
            let options = ExtractOptions {
                max_pages: 1,
                parallel,
                ..ExtractOptions::default()
            };
            let text = extract_document(kind.engine(), &path, &options, &pool).await;
            let text = text.unwrap_or_else(|| panic!("{} failed on the first page", kind));
            assert!(text.contains("A Study of X"), "{}: {:?}", kind, text);
            assert!(!text.contains("Undefined font"), "{}: {:?}", kind, text);
        }
    }

    pool.shutdown().await;
}

#[tokio::test]
async fn test_portion_strategy_reads_first_and_last_pages() {
    let docs = tempfile::tempdir().unwrap();
    let path = docs.path().join("long.pdf");
    let filler: &[&str] = &["Conclusions are premature here", "", "filler"];
    std::fs::write(
        &path,
        build_pdf(&[FIRST_PAGE, filler, filler, filler, filler, LAST_PAGE]),
    )
    .unwrap();

    let temp = tempfile::tempdir().unwrap();
    let mut settings = settings(EngineKind::Layout, temp.path());
    settings.extraction.strategy = PageStrategy::portion(10, 10);
    let summarizer = Summarizer::new(settings).unwrap();

    let summary = summarizer
        .summarize(&path.to_string_lossy(), false, 20)
        .await;
    assert_eq!(summary, expected_summary());
    summarizer.shutdown().await;
}

#[tokio::test]
async fn test_http_failures_give_default_summary() {
    let mut server = mockito::Server::new_async().await;
    let _missing = server
        .mock("GET", "/missing.pdf")
        .with_status(404)
        .create_async()
        .await;
    let _failing = server
        .mock("GET", "/failing.pdf")
        .with_status(500)
        .create_async()
        .await;
    let _page = server
        .mock("GET", "/landing")
        .with_status(401)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let summarizer = Summarizer::new(settings(EngineKind::Lopdf, temp.path())).unwrap();

    for path in ["/missing.pdf", "/failing.pdf", "/landing"] {
        let summary = summarizer
            .summarize(&format!("{}{}", server.url(), path), true, 20)
            .await;
        assert_eq!(summary, Summary::default(), "{}", path);
    }
    assert_eq!(
        summarizer
            .summarize_document(&format!("{}/missing.pdf", server.url()), true, 20)
            .await,
        None
    );
    assert!(dir_is_empty(temp.path()));
    summarizer.shutdown().await;
}

#[tokio::test]
async fn test_corrupt_download_never_escapes() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/corrupt.pdf")
        .with_status(200)
        .with_body("%PDF-1.4\nthis is not really a pdf\n%%EOF")
        .create_async()
        .await;

    for kind in EngineKind::ALL {
        let temp = tempfile::tempdir().unwrap();
        let summarizer = Summarizer::new(settings(kind, temp.path())).unwrap();
        let summary = summarizer
            .summarize(&format!("{}/corrupt.pdf", server.url()), true, 20)
            .await;

        assert_eq!(summary.abstract_summary, NOT_AVAILABLE, "{}", kind);
        assert!(summary.is_empty(), "{}", kind);
        assert!(dir_is_empty(temp.path()), "{}", kind);
        summarizer.shutdown().await;
    }
}

#[tokio::test]
async fn test_pool_shared_by_concurrent_calls() {
    let docs = tempfile::tempdir().unwrap();
    let path = write_paper(docs.path());
    let location = path.to_string_lossy().to_string();
    let temp = tempfile::tempdir().unwrap();

    let mut settings = settings(EngineKind::Layout, temp.path());
    settings.extraction.parallel = true;
    let summarizer = Arc::new(Summarizer::new(settings).unwrap());

    let calls = (0..6).map(|_| {
        let summarizer = Arc::clone(&summarizer);
        let location = location.clone();
        tokio::spawn(async move { summarizer.summarize(&location, false, 20).await })
    });
    for summary in futures_util::future::join_all(calls).await {
        assert_eq!(summary.unwrap(), expected_summary());
    }

    let summarizer = Arc::try_unwrap(summarizer).unwrap();
    assert_eq!(summarizer.pool_size(), 2);
    summarizer.shutdown().await;
}

#[tokio::test]
async fn test_harvest_links_from_results_page() {
    let mut server = mockito::Server::new_async().await;
    let html = r#"<html><body>
        <div class="gs_r"><div class="gs_ggs"><div class="gs_ggsd"><div class="gs_or_ggsm">
            <a href="https://example.org/one.pdf">[PDF] example.org</a>
        </div></div></div>
        <div class="gs_ri">
            <h3 class="gs_rt"><a href="https://example.org/one">Paper One</a></h3>
            <div class="gs_a">A Smith, B Jones&nbsp;- Journal of X, 2021</div>
        </div></div>
        <a href="https://example.org/one.pdf">duplicate outside any entry</a>
        <a href="/local.pdf">relative</a>
    </body></html>"#;
    let _mock = server
        .mock("GET", "/scholar")
        .with_status(200)
        .with_body(html)
        .create_async()
        .await;

    let client = HttpClient::new().unwrap();
    let links = harvest_links(
        &client,
        &format!("{}/scholar", server.url()),
        RetryConfig::default().max_attempts(1),
    )
    .await;

    assert_eq!(links.len(), 2);
    assert_eq!(links[0].url, "https://example.org/one.pdf");
    assert_eq!(links[0].title, "Paper One");
    assert_eq!(links[0].authors, "A Smith, B Jones");
    assert_eq!(links[1].url, "https://example.org/one.pdf");
    assert_eq!(links[1].title, "");
}
