//! Terminal output for the command-line tool.
//!
//! Colored section headers, status icons and progress indicators used by
//! the `scholar-digest` binary.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{ArticleRecord, CandidateLink, Summary, NOT_AVAILABLE};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

fn print_field(title: &str, value: &str) {
    print_section(title);
    if value == NOT_AVAILABLE {
        println!("{}", value.dimmed());
    } else {
        println!("{}", value);
    }
}

/// Print the four sections of a summary.
pub fn print_summary(summary: &Summary) {
    print_field("Keywords", &summary.keywords);
    print_field("Abstract", &summary.abstract_summary);
    print_field("Future work", &summary.future_work);
    print_field("Conclusions", &summary.conclusions);
    println!();
}

/// Print harvested links, one per line with title and authors underneath.
pub fn print_links(links: &[CandidateLink]) {
    for (i, link) in links.iter().enumerate() {
        println!("{:>3}. {}", i + 1, link.url.blue());
        if !link.title.is_empty() {
            println!("     {}", truncate_with_ellipsis(&link.title, 90).bold());
        }
        if !link.authors.is_empty() {
            println!("     {}", truncate_with_ellipsis(&link.authors, 90).dimmed());
        }
    }
}

/// Print an article record with its summary.
pub fn print_record(record: &ArticleRecord) {
    println!();
    println!("{}", "─".repeat(80).dimmed());
    let title = if record.title.is_empty() {
        record.url.as_str()
    } else {
        record.title.as_str()
    };
    println!("{}", title.blue().bold());
    if !record.authors.is_empty() {
        println!("{}", record.authors.green());
    }
    println!("{}", record.url.dimmed());
    print_summary(&record.summary());
}

/// Truncate text to `max_chars` characters, ending with "..." when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if max_chars <= 3 {
        return "...".to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", truncated)
}

/// Spinner shown while a single document is processed.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Clear the spinner from the terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Progress over a batch of documents.
pub struct DigestProgress {
    pb: ProgressBar,
}

impl DigestProgress {
    pub fn new(len: u64, msg: &str) -> Self {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::with_template("{msg}: {bar:40.cyan/blue} {pos}/{len} ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░ "),
        );
        pb.set_message(msg.to_string());

        Self { pb }
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    pub fn finish(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Error), "✗");
        assert_eq!(status_icon(Status::Warning), "⚠");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
        assert_eq!(truncate_with_ellipsis("Überprüfung der Daten", 8), "Überp...");
    }
}
