// Re-export modules
pub mod config;
pub mod crawlers;
pub mod dedup;
pub mod filter;
pub mod history;
pub mod matcher;
pub mod parsers;
pub mod results;

// Re-export commonly used types for convenience
pub use config::SearchConfig;
pub use crawlers::{Credentials, Fetch, FetchError, HttpFetcher};
pub use history::{HistoryError, HistoryStore, JsonFileHistory, MemoryHistory, SearchHistoryEntry};
pub use matcher::highlight;
pub use results::{CrawlState, HrefMatch, PageResult, SearchOutcome};

use chrono::Utc;
use crawlers::{Crawler, Resume};
use filter::{UrlFilter, UrlFilterConfig};
use matcher::Matcher;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Errors that stop a search before any page is crawled
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{0}', only http and https can be crawled")]
    UnsupportedScheme(String),
    #[error("URL has no host: {0}")]
    MissingHost(String),
    #[error("Search text is empty")]
    EmptySearchText,
    #[error("Cannot build a matcher for '{0}'")]
    Matcher(String),
    #[error("Invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("No history store configured")]
    NoHistory,
}

/// One search: where to start, what to look for and how
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub seed_url: String,
    pub search_text: String,
    pub credentials: Option<Credentials>,
    /// Continue an earlier search for the same term instead of starting over
    pub skip_visited: bool,
}

impl CrawlRequest {
    pub fn new(seed_url: impl Into<String>, search_text: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            search_text: search_text.into(),
            credentials: None,
            skip_visited: true,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_skip_visited(mut self, skip_visited: bool) -> Self {
        self.skip_visited = skip_visited;
        self
    }
}

/// Parse a seed URL and check that it can be crawled
pub fn parse_seed(seed_url: &str) -> Result<Url, SearchError> {
    let url = Url::parse(seed_url.trim()).map_err(|source| SearchError::InvalidUrl {
        url: seed_url.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SearchError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SearchError::MissingHost(seed_url.to_string()));
    }
    Ok(url)
}

/// Entry point for running searches.
///
/// A `Searcher` holds no per-crawl state; every call to [`Searcher::search`]
/// builds a fresh crawl context, so one instance can serve concurrent
/// searches.
pub struct Searcher<F = HttpFetcher> {
    config: SearchConfig,
    fetcher: F,
    history: Option<Arc<dyn HistoryStore>>,
}

impl Searcher<HttpFetcher> {
    /// Create a searcher with an HTTP fetcher built from `config`.
    /// A `history_path` in the config attaches a JSON history file.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Load configuration from a file
    pub fn from_config_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = SearchConfig::from_file(path)?;
        Ok(Self::new(config)?)
    }

    /// Load configuration from a string
    pub fn from_config_str(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = SearchConfig::from_str(config_str)?;
        Ok(Self::new(config)?)
    }
}

impl<F: Fetch + Sync> Searcher<F> {
    /// Create a searcher that fetches pages through `fetcher`
    pub fn with_fetcher(config: SearchConfig, fetcher: F) -> Self {
        let history = config
            .history_path
            .as_ref()
            .map(|path| Arc::new(JsonFileHistory::new(path)) as Arc<dyn HistoryStore>);

        Self {
            config,
            fetcher,
            history,
        }
    }

    /// Use `store` for search history, replacing any configured one
    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Most recent searches, newest first, capped at `history_limit`
    pub fn recent_searches(&self) -> Result<Vec<SearchHistoryEntry>, SearchError> {
        let store = self.history.as_ref().ok_or(SearchError::NoHistory)?;
        Ok(store.recent(self.config.history_limit)?)
    }

    /// Run a search to completion
    pub async fn search(&self, request: &CrawlRequest) -> SearchOutcome {
        self.search_with_cancel(request, CancellationToken::new()).await
    }

    /// Run a search that stops early when `cancel` is triggered.
    /// Whatever was found before cancellation is returned.
    pub async fn search_with_cancel(
        &self,
        request: &CrawlRequest,
        cancel: CancellationToken,
    ) -> SearchOutcome {
        ::log::debug!("Search state: {:?}", CrawlState::Idle);
        match self.run(request, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                ::log::error!("Search for '{}' failed: {}", request.search_text, e);
                ::log::debug!("Search state: {:?}", CrawlState::Failed);
                SearchOutcome::failed(e)
            }
        }
    }

    async fn run(
        &self,
        request: &CrawlRequest,
        cancel: CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        let seed = parse_seed(&request.seed_url)?;
        if request.search_text.trim().is_empty() {
            return Err(SearchError::EmptySearchText);
        }
        let matcher = Matcher::with_context(&request.search_text, self.config.context_chars)
            .ok_or_else(|| SearchError::Matcher(request.search_text.clone()))?;

        let mut filter_config = UrlFilterConfig::for_seed(&seed);
        filter_config
            .include_patterns
            .extend(self.config.include_patterns.iter().cloned());
        filter_config
            .exclude_patterns
            .extend(self.config.exclude_patterns.iter().cloned());
        let filter = UrlFilter::new(filter_config)?;

        let resume = if request.skip_visited {
            self.load_resume(&request.search_text)
        } else {
            None
        };
        let is_research = resume.is_some();

        ::log::debug!("Search state: {:?}", CrawlState::Running);
        let report = Crawler::new(&self.fetcher, &self.config, filter, matcher)
            .with_credentials(request.credentials.as_ref())
            .with_cancellation(cancel)
            .run(&seed, resume)
            .await;
        ::log::debug!("Search state: {:?}", CrawlState::Completed);

        if let Some(store) = &self.history {
            let update = SearchHistoryEntry {
                search_text: request.search_text.clone(),
                base_url: request.seed_url.clone(),
                urls: report.visited.clone(),
                results: report.results.clone(),
                total_urls: report.visited.len(),
                skipped_urls: report.skipped.clone(),
                last_updated: Utc::now(),
            };
            if let Err(e) = store.save(update) {
                ::log::warn!("Could not save search history: {}", e);
            }
        }

        Ok(SearchOutcome {
            success: true,
            total_pages_visited: report.visited.len(),
            results: report.results,
            error: None,
            is_research,
            skipped_count: report.requeued,
            cancelled: report.cancelled,
            state: CrawlState::Completed,
        })
    }

    /// Visited and skipped URLs from an earlier search for `term`
    fn load_resume(&self, term: &str) -> Option<Resume> {
        let store = self.history.as_ref()?;
        match store.load(term) {
            Ok(Some(entry)) => {
                ::log::info!(
                    "Continuing earlier search for '{}' ({} URLs visited, {} skipped)",
                    term,
                    entry.urls.len(),
                    entry.skipped_urls.len()
                );
                Some(Resume {
                    visited: entry.urls.into_iter().collect(),
                    skipped: entry.skipped_urls,
                })
            }
            Ok(None) => None,
            Err(e) => {
                ::log::warn!("Could not load search history, starting fresh: {}", e);
                None
            }
        }
    }
}
