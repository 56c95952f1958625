use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a search crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum link depth from the seed page (the seed is depth 0)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of pages fetched in one invocation
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of frontier entries processed per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause after each batch, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Pause after each individual fetch, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Maximum number of new links propagated from a single page
    #[serde(default = "default_max_links_per_page")]
    pub max_links_per_page: usize,

    /// Maximum number of fetches in flight inside a batch
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Drop header/footer/nav/aside before selecting the main content
    #[serde(default = "default_strip_layout_tags")]
    pub strip_layout_tags: bool,

    /// Jaccard similarity above which a page counts as boilerplate
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Characters of context kept on each side of a snippet match
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,

    /// Occurrences considered when building snippets
    #[serde(default = "default_max_context_matches")]
    pub max_context_matches: usize,

    /// Snippets kept per page
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Regex patterns for URLs to include
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// JSON file backing the search history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,

    /// Number of entries returned when listing the history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_max_depth() -> usize {
    3
}

fn default_max_pages() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay_ms() -> u64 {
    200
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_max_links_per_page() -> usize {
    10
}

fn default_max_concurrency() -> usize {
    4
}

fn default_strip_layout_tags() -> bool {
    true
}

fn default_similarity_threshold() -> f64 {
    crate::dedup::DEFAULT_SIMILARITY_THRESHOLD
}

fn default_context_chars() -> usize {
    crate::matcher::DEFAULT_CONTEXT_CHARS
}

fn default_max_context_matches() -> usize {
    5
}

fn default_max_snippets() -> usize {
    3
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_history_limit() -> usize {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            request_delay_ms: default_request_delay_ms(),
            max_links_per_page: default_max_links_per_page(),
            max_concurrency: default_max_concurrency(),
            strip_layout_tags: default_strip_layout_tags(),
            similarity_threshold: default_similarity_threshold(),
            context_chars: default_context_chars(),
            max_context_matches: default_max_context_matches(),
            max_snippets: default_max_snippets(),
            user_agent: default_user_agent(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            history_path: None,
            history_limit: default_history_limit(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_str(&contents)
    }

    /// Load configuration from a JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(contents)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
