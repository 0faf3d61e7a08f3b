//! Ordered (heading, boundary) pattern tables for each section.
//!
//! Each entry is tried in order. The heading regex marks where a section's
//! text starts (the capture begins right after the heading match) and the
//! boundary regex marks where it stops; a pattern only matches when its
//! boundary is found after at least one character of captured text.
//! Headings must start with a capital letter so that lowercase mentions
//! in body text ("we rank keywords") are not taken for sections; the rest
//! of the word matches in any case. New layouts are supported by adding
//! rows here.

/// Start of a heading line with an optional section number ("6.", "6.1", "VI.")
macro_rules! heading_line {
    ($keyword:literal) => {
        concat!(
            r"(?m)^[ \t]*(?:[0-9]+(?:\.[0-9]+)*\.?|[IVXLC]+\.)?[ \t]*",
            $keyword
        )
    };
}

/// A blank line, optionally holding stray spaces
const PARAGRAPH_BREAK: &str = r"\n[ \t]*\n";

/// A blank line followed by a short one-word heading line
const NEXT_HEADING: &str = r"\n ?\n ?\n?\w+ *\n";

pub(super) const ABSTRACT: &[(&str, &str)] = &[
    // "Abstract" on its own line or followed by a space, up to a blank line or the keywords
    (
        r"\bA(?i:bstract)[ \t]*[:.\-—–]?[ \n]+",
        r"\n\n|Key ?[Ww]ords?",
    ),
    // Abstract running straight into a keywords block
    (r"\bA(?i:bstract)", r"\n ?\n ?Key ?[Ww]ords?"),
    // Abstract glued to its text, up to the first blank line
    (r"\bA(?i:bstract)[ \n]?", r"\n\n"),
];

pub(super) const KEYWORDS: &[(&str, &str)] = &[
    // "Keywords: a, b" closed by a whitespace-only line
    (r"\bK(?i:ey ?words?)[ \t]*:?[ \t]+", r"\n[ \t]+\n"),
    // Keywords possibly wrapped onto the next lines, up to a blank line
    (r"\bK(?i:ey ?words?)[ \t]*[:.\-—–]?\s*", r"\n\n"),
    // IEEE style "Index Terms"
    (r"\bI(?i:ndex terms?)", r"\n\n"),
];

pub(super) const CONCLUSIONS: &[(&str, &str)] = &[
    // Conclusion heading line, up to the next one-word heading
    (heading_line!(r"C(?i:onclusions?)[^\n]*\n"), NEXT_HEADING),
    // Conclusion heading line, up to a well-known trailing section
    (
        heading_line!(r"C(?i:onclusions?)[^\n]*\n+"),
        r"\n\s*(?:A(?i:cknowledge?ments?)|R(?i:eferences)|B(?i:ibliography)|A(?i:ppendix))\b",
    ),
    // Heading separated from its text by a wide layout gap
    (r"\bC(?i:onclusions?)[^\n]*?[ \n]{4,}", NEXT_HEADING),
    // Any mention followed by a line break, up to the paragraph end
    (r"\bC(?i:onclusions?)[^\n]*\n+", r"\n ?\n"),
];

pub(super) const FUTURE_WORK: &[(&str, &str)] = &[
    (heading_line!(r"F(?i:uture work)[ \t]*[:.]?[ \n]+"), r"\n\n"),
    (heading_line!(r"F(?i:uture directions?)[^\n]*\n+"), PARAGRAPH_BREAK),
    (
        heading_line!(r"F(?i:uture scope)[^\n]*\n+"),
        r"\n\n\w+ ?\n|C(?i:onclusions?)",
    ),
    // Heading split across lines ("Future\nResearch")
    (heading_line!(r"F(?i:uture)\s{0,2}(?i:research)[^\n]*\n+"), r"\n\n\w+\n"),
    (heading_line!(r"F(?i:uture studies)[^\n]*\n+"), NEXT_HEADING),
    // Inline mention without a heading of its own
    (r"\bF(?i:uture work)[ \t]*[:.]?[ \n]+", r"\n\n"),
];
