//! Search-term matching and `<mark>` highlighting
//!
//! All matching is literal (regex metacharacters in the term are escaped)
//! and case-insensitive. Highlighting only ever inserts markers around
//! matches, so removing the markers gives back the input unchanged.

use crate::filter::normalize_url;
use crate::parsers::PageLink;
use crate::results::HrefMatch;
use regex::{Regex, RegexBuilder};
use url::Url;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

/// Characters of context kept on each side of a snippet match
pub const DEFAULT_CONTEXT_CHARS: usize = 100;

/// Wrap every case-insensitive occurrence of `term` in `text` with `<mark>` tags
pub fn highlight(text: &str, term: &str) -> String {
    match Matcher::new(term) {
        Some(matcher) => matcher.highlight(text),
        None => text.to_string(),
    }
}

/// Remove highlight markers
pub fn strip_marks(text: &str) -> String {
    text.replace(MARK_OPEN, "").replace(MARK_CLOSE, "")
}

/// Compiled matcher for one search term
#[derive(Debug, Clone)]
pub struct Matcher {
    term: String,
    pattern: Regex,
    window: Regex,
    journal: Option<Regex>,
}

impl Matcher {
    /// Compile a matcher. Returns `None` for an empty term.
    pub fn new(term: &str) -> Option<Self> {
        Self::with_context(term, DEFAULT_CONTEXT_CHARS)
    }

    /// Compile a matcher whose snippets keep `context_chars` characters on
    /// each side of a match
    pub fn with_context(term: &str, context_chars: usize) -> Option<Self> {
        if term.is_empty() {
            return None;
        }

        let escaped = regex::escape(term);
        let pattern = RegexBuilder::new(&escaped)
            .case_insensitive(true)
            .build()
            .ok()?;

        let window = RegexBuilder::new(&format!(
            "(.{{0,{n}}})({escaped})(.{{0,{n}}})",
            n = context_chars
        ))
        .case_insensitive(true)
        .build()
        .map_err(|e| ::log::warn!("Cannot build snippet pattern for '{}': {}", term, e))
        .ok()?;

        // Numeric identifiers only match a whole `/journal/<n>` path segment
        let journal = if term.chars().all(|c| c.is_ascii_digit()) {
            Some(Regex::new(&format!("/journal/{}(?:[/?#]|$)", escaped)).ok()?)
        } else {
            None
        };

        Some(Self {
            term: term.to_string(),
            pattern,
            window,
            journal,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_numeric(&self) -> bool {
        self.journal.is_some()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn count(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }

    /// Wrap every occurrence in `<mark>` tags, keeping its original casing
    pub fn highlight(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                format!("{}{}{}", MARK_OPEN, &caps[0], MARK_CLOSE)
            })
            .into_owned()
    }

    /// Snippets of up to `context_chars` characters around the first
    /// `max_matches` occurrences, each highlighted and wrapped in ellipses.
    pub fn context_snippets(&self, text: &str, max_matches: usize) -> Vec<String> {
        self.window
            .captures_iter(text)
            .take(max_matches)
            .map(|caps| {
                let before = caps.get(1).map_or("", |m| m.as_str()).trim_start();
                let found = caps.get(2).map_or("", |m| m.as_str());
                let after = caps.get(3).map_or("", |m| m.as_str()).trim_end();
                format!("...{}...", self.highlight(&format!("{before}{found}{after}")))
            })
            .collect()
    }

    /// Match an anchor found on `page_url`.
    ///
    /// Numeric terms use the `/journal/<term>` rule on the normalized URL;
    /// other terms match the normalized URL or the anchor text.
    pub fn match_link(&self, link: &PageLink, page_url: &Url) -> Option<HrefMatch> {
        let normalized = normalize_url(&link.url);

        let matched = match &self.journal {
            Some(journal) => journal.is_match(&normalized),
            None => self.is_match(&normalized) || self.is_match(&link.text),
        };

        if !matched {
            return None;
        }

        let raw = link.url.to_string();
        let href = self.highlight(&raw);
        let text = if link.text.is_empty() {
            href.clone()
        } else {
            self.highlight(&link.text)
        };

        Some(HrefMatch {
            text,
            href,
            url: raw,
            page_url: page_url.to_string(),
        })
    }
}
