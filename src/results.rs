use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A link on a page whose URL or anchor text matched the search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrefMatch {
    /// Highlighted anchor text (the highlighted URL when the anchor has no text)
    pub text: String,

    /// Highlighted absolute URL
    pub href: String,

    /// Absolute URL, unmodified
    pub url: String,

    /// Page the link was found on
    pub page_url: String,
}

/// Matches found on one crawled page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Normalized URL of the page
    pub url: String,

    /// Title of the page (the URL when it has none)
    pub title: String,

    /// Link distance from the seed page
    pub depth: usize,

    /// Occurrences of the term in the main text
    #[serde(default)]
    pub matches: usize,

    /// Highlighted main text, present when the term occurs in it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_match: Option<String>,

    /// Highlighted head text, present when the term occurs in it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_match: Option<String>,

    /// Matching links on the page
    #[serde(default)]
    pub href_matches: Vec<HrefMatch>,

    /// Highlighted context snippets around body matches
    #[serde(default)]
    pub snippets: Vec<String>,
}

impl PageResult {
    /// True if at least one match category is non-empty
    pub fn has_matches(&self) -> bool {
        self.body_match.is_some() || self.head_match.is_some() || !self.href_matches.is_empty()
    }
}

/// Ordered collection holding at most one result per URL.
///
/// When a URL is recorded twice the shallower result wins and keeps the
/// position of the first insertion.
#[derive(Debug, Default, Clone)]
pub struct ResultSet {
    results: Vec<PageResult>,
    index: HashMap<String, usize>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result. Returns true if it was stored.
    pub fn insert(&mut self, result: PageResult) -> bool {
        match self.index.get(&result.url) {
            Some(&pos) => {
                if result.depth < self.results[pos].depth {
                    self.results[pos] = result;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(result.url.clone(), self.results.len());
                self.results.push(result);
                true
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<&PageResult> {
        self.index.get(url).map(|&pos| &self.results[pos])
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_vec(self) -> Vec<PageResult> {
        self.results
    }
}

impl Extend<PageResult> for ResultSet {
    fn extend<I: IntoIterator<Item = PageResult>>(&mut self, iter: I) {
        for result in iter {
            self.insert(result);
        }
    }
}

/// Lifecycle of one crawl invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Everything the caller gets back from a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// False only when the search could not be run at all
    pub success: bool,

    /// Pages with at least one match, in crawl order
    pub results: Vec<PageResult>,

    /// Pages fetched during this invocation
    pub total_pages_visited: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True if this run continued a previous search for the same term
    #[serde(default)]
    pub is_research: bool,

    /// Previously skipped URLs that were queued again
    #[serde(default)]
    pub skipped_count: usize,

    /// True if the crawl was stopped by a cancellation request
    #[serde(default)]
    pub cancelled: bool,

    pub state: CrawlState,
}

impl SearchOutcome {
    /// Outcome of a search that failed before or outside the crawl
    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            total_pages_visited: 0,
            error: Some(error.to_string()),
            is_research: false,
            skipped_count: 0,
            cancelled: false,
            state: CrawlState::Failed,
        }
    }
}
