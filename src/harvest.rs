//! Candidate document links harvested from search-results pages.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use crate::models::CandidateLink;
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Base URL of the Google Scholar results page
pub const SCHOLAR_URL: &str = "https://scholar.google.com/scholar?hl=en&as_sdt=0%2C5&q=";

/// How many ancestors above a link hold its result entry
const RESULT_DEPTH: usize = 4;

/// Results shown per results page
pub const RESULTS_PER_PAGE: usize = 10;

/// Results-page URL for `keywords`, restricted to PDF documents.
///
/// `start` is the pagination offset (results come ten to a page).
pub fn scholar_search_url<S: AsRef<str>>(keywords: &[S], start: usize) -> String {
    search_url(SCHOLAR_URL, keywords, start)
}

/// Like [`scholar_search_url`] for any results page taking the same query format
pub fn search_url<S: AsRef<str>>(base: &str, keywords: &[S], start: usize) -> String {
    let query = keywords
        .iter()
        .map(|keyword| {
            keyword
                .as_ref()
                .split_whitespace()
                .map(|word| urlencoding::encode(word).into_owned())
                .collect::<Vec<_>>()
                .join("+")
        })
        .filter(|keyword| !keyword.is_empty())
        .chain(std::iter::once("filetype%3Apdf".to_string()))
        .collect::<Vec<_>>()
        .join("+");

    format!("{}{}&start={}", base, query, start)
}

/// Extract candidate document links from a results page.
///
/// Anchors qualify when their target mentions `.pdf` and is absolute
/// (`http...`). Title and authors come from the enclosing result entry and
/// are empty when that structure is missing. Duplicates are dropped, keeping
/// the first occurrence.
pub fn harvest(html: &str) -> Vec<CandidateLink> {
    let document = Html::parse_document(html);
    let Some(anchor_selector) = Selector::parse("a[href]").ok() else {
        return Vec::new();
    };
    let title_selector = Selector::parse("h3.gs_rt a").ok();
    let authors_selector = Selector::parse("div.gs_a").ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(".pdf") || !href.starts_with("http") {
            continue;
        }

        let entry = result_entry(anchor);
        let title = entry
            .zip(title_selector.as_ref())
            .and_then(|(entry, selector)| entry.select(selector).next())
            .map(|title| element_text(title).trim().to_string())
            .unwrap_or_default();
        let authors = entry
            .zip(authors_selector.as_ref())
            .and_then(|(entry, selector)| entry.select(selector).next())
            .map(|byline| authors_from_byline(&element_text(byline)))
            .unwrap_or_default();

        let link = CandidateLink::new(href, title, authors);
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

/// Fetch a results page and harvest its links.
///
/// Never fails: fetch errors are logged and yield an empty list.
pub async fn harvest_links(
    client: &HttpClient,
    url: &str,
    retry: RetryConfig,
) -> Vec<CandidateLink> {
    match with_retry(retry, || client.fetch_text(url)).await {
        Ok(html) => {
            let links = harvest(&html);
            tracing::info!("Fetched {} urls from {}", links.len(), url);
            links
        }
        Err(e) => {
            tracing::error!("Error while fetching URLs from {}: {}", url, e);
            Vec::new()
        }
    }
}

fn result_entry(anchor: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut node = anchor;
    for _ in 0..RESULT_DEPTH {
        node = node.parent().and_then(ElementRef::wrap)?;
    }
    Some(node)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Author list is the byline up to the first non-breaking space
fn authors_from_byline(byline: &str) -> String {
    byline.split('\u{a0}').next().unwrap_or_default().to_string()
}
