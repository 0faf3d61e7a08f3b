//! Page selection strategies.
//!
//! Abstracts and conclusions cluster at the start and end of a paper, so
//! [`PageStrategy::Portion`] bounds the cost of long documents by reading only
//! a leading and a trailing window.

use serde::{Deserialize, Serialize};

/// Ordered, distinct page indices to decode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSet(Vec<usize>);

impl PageSet {
    /// Every index in `0..count`
    pub fn all(count: usize) -> Self {
        Self((0..count).collect())
    }

    /// Build from arbitrary indices, sorting and removing duplicates
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut pages: Vec<usize> = indices.into_iter().collect();
        pages.sort_unstable();
        pages.dedup();
        Self(pages)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

/// Which pages of a document are worth decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageStrategy {
    /// Every page
    All,
    /// A leading and a trailing window, each given as a percentage of the page count
    Portion {
        #[serde(default = "default_portion")]
        start_percent: u32,
        #[serde(default = "default_portion")]
        end_percent: u32,
    },
}

fn default_portion() -> u32 {
    33
}

impl Default for PageStrategy {
    fn default() -> Self {
        PageStrategy::All
    }
}

impl PageStrategy {
    /// Portion strategy with the given windows
    pub fn portion(start_percent: u32, end_percent: u32) -> Self {
        PageStrategy::Portion {
            start_percent,
            end_percent,
        }
    }

    /// Choose page indices out of `0..total_pages`.
    ///
    /// Portion takes the first `ceil(total * start / 100)` and the last
    /// `ceil(total * end / 100)` indices; overlapping windows are merged.
    pub fn select(&self, total_pages: usize) -> PageSet {
        match *self {
            PageStrategy::All => PageSet::all(total_pages),
            PageStrategy::Portion {
                start_percent,
                end_percent,
            } => {
                let head = window(total_pages, start_percent);
                let tail = window(total_pages, end_percent);
                let tail_start = (total_pages - tail).max(head);
                PageSet((0..head).chain(tail_start..total_pages).collect())
            }
        }
    }
}

/// ceil(total * percent / 100), capped at total
fn window(total: usize, percent: u32) -> usize {
    let percent = percent.min(100) as usize;
    ((total * percent).div_ceil(100)).min(total)
}

/// Pages to decode for a document with `total_pages`, read no further than `max_pages`
pub fn select_pages(total_pages: usize, max_pages: usize, strategy: &PageStrategy) -> PageSet {
    strategy.select(total_pages.min(max_pages))
}
