//! Section extraction from flat document text.
//!
//! Every section owns an ordered list of [`SectionPattern`]s. Patterns are
//! tried in order and the first one that yields non-empty text wins; when
//! none match the field is set to [`NOT_AVAILABLE`].

mod patterns;

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::models::{Summary, NOT_AVAILABLE};

/// A heading regex paired with the boundary that ends the section.
#[derive(Debug, Clone)]
pub struct SectionPattern {
    heading: Regex,
    boundary: Regex,
}

impl SectionPattern {
    /// Compile a pattern from its heading and boundary expressions
    pub fn new(heading: &str, boundary: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            heading: Regex::new(heading)?,
            boundary: Regex::new(boundary)?,
        })
    }

    pub fn heading(&self) -> &str {
        self.heading.as_str()
    }

    pub fn boundary(&self) -> &str {
        self.boundary.as_str()
    }

    /// Raw text between a heading match and the first boundary after it.
    ///
    /// The capture is never empty: the boundary is only searched from the
    /// second character following the heading. Later heading occurrences
    /// are tried when an earlier one has no boundary or captures only
    /// whitespace.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        for heading in self.heading.find_iter(text) {
            let start = heading.end();
            let Some(first) = text[start..].chars().next() else {
                break;
            };

            if let Some(boundary) = self.boundary.find_at(text, start + first.len_utf8()) {
                let captured = &text[start..boundary.start()];
                if !clean_capture(captured).is_empty() {
                    return Some(captured);
                }
            }
        }
        None
    }
}

fn compile(table: &[(&str, &str)]) -> Vec<SectionPattern> {
    table
        .iter()
        .map(|(heading, boundary)| {
            SectionPattern::new(heading, boundary).expect("built-in section pattern is valid")
        })
        .collect()
}

static ABSTRACT_PATTERNS: Lazy<Vec<SectionPattern>> = Lazy::new(|| compile(patterns::ABSTRACT));
static KEYWORD_PATTERNS: Lazy<Vec<SectionPattern>> = Lazy::new(|| compile(patterns::KEYWORDS));
static CONCLUSION_PATTERNS: Lazy<Vec<SectionPattern>> =
    Lazy::new(|| compile(patterns::CONCLUSIONS));
static FUTURE_WORK_PATTERNS: Lazy<Vec<SectionPattern>> =
    Lazy::new(|| compile(patterns::FUTURE_WORK));

/// The sections recovered for a [`Summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Abstract,
    Keywords,
    Conclusions,
    FutureWork,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Keywords,
        Section::Abstract,
        Section::FutureWork,
        Section::Conclusions,
    ];

    /// Built-in patterns for this section, in priority order
    pub fn patterns(&self) -> &'static [SectionPattern] {
        match self {
            Section::Abstract => &ABSTRACT_PATTERNS,
            Section::Keywords => &KEYWORD_PATTERNS,
            Section::Conclusions => &CONCLUSION_PATTERNS,
            Section::FutureWork => &FUTURE_WORK_PATTERNS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Section::Abstract => "abstract",
            Section::Keywords => "keywords",
            Section::Conclusions => "conclusions",
            Section::FutureWork => "future work",
        }
    }

    /// Extract this section from `text`, or [`NOT_AVAILABLE`]
    pub fn extract(&self, text: &str) -> String {
        let extracted = extract_section(text, self.patterns());
        if extracted == NOT_AVAILABLE {
            tracing::debug!("No {} section found", self.name());
        }
        extracted
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which pattern matched and the cleaned text it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    pub pattern_index: usize,
    pub text: String,
}

/// First pattern (in order) that yields non-empty cleaned text
pub fn match_section(text: &str, patterns: &[SectionPattern]) -> Option<SectionMatch> {
    patterns.iter().enumerate().find_map(|(index, pattern)| {
        pattern.capture(text).map(|captured| {
            tracing::trace!(
                pattern = index,
                heading = pattern.heading(),
                "Section pattern matched"
            );
            SectionMatch {
                pattern_index: index,
                text: clean_capture(captured),
            }
        })
    })
}

/// Extract a section with an ordered pattern list.
///
/// Returns [`NOT_AVAILABLE`] when no pattern matches. Pure and deterministic.
pub fn extract_section(text: &str, patterns: &[SectionPattern]) -> String {
    match_section(text, patterns)
        .map(|found| found.text)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Run every section extractor over a document's text
pub fn summarize_text(text: &str) -> Summary {
    Summary {
        keywords: Section::Keywords.extract(text),
        abstract_summary: Section::Abstract.extract(text),
        future_work: Section::FutureWork.extract(text),
        conclusions: Section::Conclusions.extract(text),
    }
}

/// Undo line-wrap artifacts and strip heading punctuation left on a capture
fn clean_capture(captured: &str) -> String {
    captured
        .replace("/\n", "\n")
        .trim()
        .trim_start_matches([':', '.', '-', '—', '–'])
        .trim()
        .to_string()
}
