//! Query matching over the item index
//!
//! Queries of 1-2 characters are a distinct "needs more input" status,
//! not an error. From 3 characters the query splits on whitespace and an
//! item matches only if every term matches its searchable text. A purely
//! numeric term matches as a whole number bounded by non-digits ("12"
//! hits "12 mm" but not "120" or "512"); everything else is a literal
//! case-insensitive substring. Results keep catalog order.

use crate::catalog::ItemIndex;
use shared::models::Item;

/// Minimum query length before matching runs
pub const MIN_QUERY_LEN: usize = 3;

/// Default page size for the visible-count cursor
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Source filter for a search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Source(String),
}

impl SourceFilter {
    fn accepts(&self, item: &Item) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Source(source) => item.source == *source,
        }
    }
}

/// Search result status
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<Item>),
    /// Query is 1-2 characters; ask for at least 3
    NeedsMoreInput,
}

/// Stateless query evaluator over an [`ItemIndex`] snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEngine;

impl SearchEngine {
    /// Run one query against the current catalog snapshot
    ///
    /// Empty query policy: show nothing for `All` (no catalog-wide
    /// browse), show the whole source when one is selected.
    pub fn search(&self, index: &ItemIndex, query: &str, filter: &SourceFilter) -> SearchOutcome {
        let query = query.trim().to_lowercase();

        if query.is_empty() {
            return match filter {
                SourceFilter::All => SearchOutcome::Results(Vec::new()),
                SourceFilter::Source(_) => SearchOutcome::Results(
                    index
                        .snapshot()
                        .iter()
                        .filter(|item| filter.accepts(item))
                        .cloned()
                        .collect(),
                ),
            };
        }
        if query.chars().count() < MIN_QUERY_LEN {
            return SearchOutcome::NeedsMoreInput;
        }

        let terms: Vec<&str> = query.split_whitespace().collect();
        let items = index.snapshot();
        let hits = items
            .iter()
            .filter(|item| filter.accepts(item))
            .filter(|item| terms.iter().all(|term| term_matches(&item.searchable_text, term)))
            .cloned()
            .collect();
        SearchOutcome::Results(hits)
    }
}

/// Match one term against lower-cased searchable text
fn term_matches(text: &str, term: &str) -> bool {
    if term.chars().all(|c| c.is_ascii_digit()) {
        whole_number_match(text, term)
    } else {
        text.contains(term)
    }
}

/// Whole-number match: every occurrence must be bounded by a non-digit
/// or the string edge on both sides
fn whole_number_match(text: &str, term: &str) -> bool {
    for (start, _) in text.match_indices(term) {
        let end = start + term.len();
        let left_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_digit());
        let right_ok = text[end..].chars().next().is_none_or(|c| !c.is_ascii_digit());
        if left_ok && right_ok {
            return true;
        }
    }
    false
}

/// Visible-count cursor: starts at one page, grows one page per "load
/// more", resets whenever the query or filter changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    visible: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            visible: page_size,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    pub fn load_more(&mut self) {
        self.visible += self.page_size;
    }

    pub fn reset(&mut self) {
        self.visible = self.page_size;
    }

    /// The currently visible slice of a result list
    pub fn page<'a>(&self, items: &'a [Item]) -> &'a [Item] {
        &items[..items.len().min(self.visible)]
    }

    /// Whether more results exist past the visible window
    pub fn has_more(&self, items: &[Item]) -> bool {
        items.len() > self.visible
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
