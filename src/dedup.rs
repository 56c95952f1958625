//! Boilerplate suppression for pages whose text repeats across a site
//!
//! Every non-duplicate page text is kept as a lowercase word set and each
//! new page is compared against all of them with the Jaccard index. This is
//! a pairwise O(n²) scan over the pages of one invocation, fine at the page
//! caps used here; larger crawls would need shingling or SimHash instead.

use std::collections::HashSet;

/// Similarity above which a text is treated as already seen
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Jaccard index of the lowercase whitespace-separated word sets of `a` and `b`.
///
/// Returns 0.0 when either text has no words.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    jaccard(&word_set(a), &word_set(b))
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Set of text blocks seen during one crawl invocation
#[derive(Debug)]
pub struct BoilerplateFilter {
    threshold: f64,
    seen: Vec<HashSet<String>>,
}

impl Default for BoilerplateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl BoilerplateFilter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            seen: Vec::new(),
        }
    }

    /// True if the text is empty or more similar than the threshold to any recorded block
    pub fn is_duplicate(&self, text: &str) -> bool {
        let words = word_set(text);
        if words.is_empty() {
            return true;
        }

        self.seen
            .iter()
            .any(|recorded| jaccard(&words, recorded) > self.threshold)
    }

    /// Remember a text block for later comparisons
    pub fn record(&mut self, text: &str) {
        let words = word_set(text);
        if !words.is_empty() {
            self.seen.push(words);
        }
    }

    /// Duplicate check followed by `record` for texts that pass.
    ///
    /// Returns true when the text is new.
    pub fn admit(&mut self, text: &str) -> bool {
        if self.is_duplicate(text) {
            return false;
        }
        self.record(text);
        true
    }

    /// Number of recorded blocks
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
