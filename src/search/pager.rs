//! Result pagination
//!
//! A pure window over the already-materialized ranked list: no
//! recomputation, no re-sorting. The control loop decides whether to keep
//! going; the pager only reports how much remains.

use super::ranker::DocumentScore;

/// Fixed-size windows over a ranked result list.
pub struct ResultPager {
    results: Vec<DocumentScore>,
    page_size: usize,
}

/// One window of results. `start` is the offset of the first entry within
/// the full list; `remaining` counts entries after this window.
pub struct PageView<'a> {
    pub entries: &'a [DocumentScore],
    pub start: usize,
    pub remaining: usize,
}

impl PageView<'_> {
    pub fn has_more(&self) -> bool {
        self.remaining > 0
    }
}

impl ResultPager {
    /// A page size of zero is clamped to one so paging always advances.
    pub fn new(results: Vec<DocumentScore>, page_size: usize) -> Self {
        Self {
            results,
            page_size: page_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The window `[offset, offset + page_size)`, clamped to list bounds.
    pub fn page(&self, offset: usize) -> PageView<'_> {
        let start = offset.min(self.results.len());
        let end = offset
            .saturating_add(self.page_size)
            .min(self.results.len());

        PageView {
            entries: &self.results[start..end],
            start,
            remaining: self.results.len() - end,
        }
    }
}
