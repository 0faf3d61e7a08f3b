//! Basic usage example for the Scholar Digest library.
//!
//! Summarizes one PDF by URL, then harvests the links of a results page and
//! summarizes the first few of them.

use scholar_digest::config::{find_config_file, load_config};
use scholar_digest::{Summarizer, NOT_AVAILABLE};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(find_config_file().as_deref())?;

    // The summarizer owns the worker pool; create it once and reuse it
    let summarizer = Summarizer::from_config(&config)?;
    println!(
        "Using {} with {} workers",
        summarizer.engine().name(),
        summarizer.pool_size()
    );

    let summary = summarizer
        .summarize("https://arxiv.org/pdf/1706.03762", true, 20)
        .await;
    println!("\nKeywords: {}", summary.keywords);
    println!("Abstract: {}", summary.abstract_summary);
    if summary.conclusions != NOT_AVAILABLE {
        println!("Conclusions: {}", summary.conclusions);
    }

    // Search results pages are harvested for PDF links, then digested
    let records = summarizer.search(&["attention", "transformer"], 3).await;
    println!("\nSummarized {} papers", records.len());
    for (i, record) in records.iter().enumerate() {
        println!("\n{}. {}", i + 1, record.title);
        println!("   Authors: {}", record.authors);
        println!("   Future work: {}", record.future_work);
    }

    summarizer.shutdown().await;
    Ok(())
}
