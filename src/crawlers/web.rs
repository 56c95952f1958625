use crate::config::SearchConfig;
use crate::crawlers::fetch::{Credentials, Fetch, FetchError, FetchedPage};
use crate::dedup::BoilerplateFilter;
use crate::filter::{UrlFilter, normalize_url};
use crate::matcher::Matcher;
use crate::parsers::{ExtractOptions, ExtractedPage, Parser, ParserType};
use crate::results::{PageResult, ResultSet};
use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone)]
struct FrontierEntry {
    url: Url,
    key: String,
    depth: usize,
}

/// State carried over from an earlier search for the same term
#[derive(Debug, Clone, Default)]
pub struct Resume {
    /// Normalized URLs fetched by earlier runs; never fetched again
    pub visited: HashSet<String>,
    /// URLs earlier runs discovered but did not fetch; queued at depth 1
    pub skipped: Vec<String>,
}

/// What one crawl invocation produced
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Pages with at least one match, in crawl order
    pub results: Vec<PageResult>,
    /// Normalized URLs fetched (or attempted) in this invocation
    pub visited: Vec<String>,
    /// URLs left out because of the page cap or the per-page link cap
    pub skipped: Vec<String>,
    /// Entries of `Resume::skipped` that were queued again
    pub requeued: usize,
    /// True if the cancellation token stopped the crawl
    pub cancelled: bool,
}

/// Batched breadth-first crawler for a single search invocation.
///
/// The frontier is a FIFO of (URL, depth) entries. Entries are taken in
/// batches of `batch_size`; fetches inside a batch run concurrently, but
/// every update to the visited set, the frontier and the results happens
/// afterwards on this task, in frontier order.
pub struct Crawler<'a, F> {
    fetcher: &'a F,
    config: &'a SearchConfig,
    filter: UrlFilter,
    matcher: Matcher,
    credentials: Option<&'a Credentials>,
    cancel: CancellationToken,
}

impl<'a, F: Fetch + Sync> Crawler<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a SearchConfig, filter: UrlFilter, matcher: Matcher) -> Self {
        Self {
            fetcher,
            config,
            filter,
            matcher,
            credentials: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Send Basic-Auth credentials with every request
    pub fn with_credentials(mut self, credentials: Option<&'a Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Stop the crawl when this token is cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Crawl from `seed` and collect matches for the search term
    pub async fn run(&self, seed: &Url, resume: Option<Resume>) -> CrawlReport {
        ::log::info!(
            "Starting crawl for '{}' at {} (max depth {}, max pages {})",
            self.matcher.term(),
            seed,
            self.config.max_depth,
            self.config.max_pages
        );

        let resume = resume.unwrap_or_default();
        let mut traversal = Traversal::new(self.config, &self.filter, &self.matcher, resume.visited);

        traversal.seed(seed);
        let requeued = traversal.requeue(&resume.skipped);

        let mut cancelled = false;
        let mut batch_no = 0usize;

        while !traversal.frontier.is_empty() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let take = self.config.batch_size.max(1).min(traversal.frontier.len());
            let batch: Vec<FrontierEntry> = traversal.frontier.drain(..take).collect();
            batch_no += 1;
            ::log::debug!(
                "Batch {}: {} URL(s) at depth {}..={}",
                batch_no,
                batch.len(),
                batch.first().map_or(0, |e| e.depth),
                batch.last().map_or(0, |e| e.depth)
            );

            for (entry, fetched) in self.fetch_batch(batch).await {
                match fetched {
                    Some(result) => traversal.handle(entry, result),
                    None => {
                        ::log::debug!("Cancelled before fetching {}", entry.key);
                        cancelled = true;
                    }
                }
            }

            if cancelled {
                break;
            }

            // Backpressure against the target site
            let delay = self.config.batch_delay();
            if !traversal.frontier.is_empty() && !delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        if cancelled {
            ::log::warn!(
                "Crawl cancelled after {} page(s), {} left in frontier",
                traversal.visited_urls.len(),
                traversal.frontier.len()
            );
        }

        ::log::info!(
            "Crawl complete - visited {} page(s), {} with matches",
            traversal.visited_urls.len(),
            traversal.results.len()
        );

        traversal.into_report(requeued, cancelled)
    }

    /// Fetch a batch concurrently; results come back in batch order.
    /// `None` marks an entry abandoned because of cancellation.
    async fn fetch_batch(
        &self,
        batch: Vec<FrontierEntry>,
    ) -> Vec<(FrontierEntry, Option<Result<FetchedPage, FetchError>>)> {
        let fetcher = self.fetcher;
        let credentials = self.credentials;
        let cancel = &self.cancel;
        let request_delay = self.config.request_delay();

        stream::iter(batch.into_iter().map(|entry| async move {
            if cancel.is_cancelled() {
                return (entry, None);
            }

            ::log::trace!("Fetching [depth {}]: {}", entry.depth, entry.url);
            let result = tokio::select! {
                _ = cancel.cancelled() => None,
                result = fetcher.fetch(&entry.url, credentials) => Some(result),
            };

            if result.is_some() && !request_delay.is_zero() {
                tokio::time::sleep(request_delay).await;
            }

            (entry, result)
        }))
        .buffered(self.config.max_concurrency.max(1))
        .collect()
        .await
    }
}

/// Invocation-scoped traversal state; only ever touched by the crawl task
struct Traversal<'a> {
    config: &'a SearchConfig,
    filter: &'a UrlFilter,
    matcher: &'a Matcher,
    extract: ExtractOptions,
    frontier: VecDeque<FrontierEntry>,
    /// Normalized URLs that must not be queued again (claimed or pre-seeded)
    seen: HashSet<String>,
    /// URLs claimed by this invocation; bounded by `max_pages`
    claimed: usize,
    visited_urls: Vec<String>,
    skipped: Vec<String>,
    skipped_seen: HashSet<String>,
    boilerplate: BoilerplateFilter,
    results: ResultSet,
}

impl<'a> Traversal<'a> {
    fn new(
        config: &'a SearchConfig,
        filter: &'a UrlFilter,
        matcher: &'a Matcher,
        previously_visited: HashSet<String>,
    ) -> Self {
        Self {
            config,
            filter,
            matcher,
            extract: ExtractOptions {
                strip_layout_tags: config.strip_layout_tags,
            },
            frontier: VecDeque::new(),
            seen: previously_visited,
            claimed: 0,
            visited_urls: Vec::new(),
            skipped: Vec::new(),
            skipped_seen: HashSet::new(),
            boilerplate: BoilerplateFilter::new(config.similarity_threshold),
            results: ResultSet::new(),
        }
    }

    fn has_capacity(&self) -> bool {
        self.claimed < self.config.max_pages
    }

    /// Mark a URL as visited and queue it. The caller checks scope and caps.
    fn claim(&mut self, mut url: Url, depth: usize) -> bool {
        url.set_fragment(None);
        let key = normalize_url(&url);
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.claimed += 1;
        self.frontier.push_back(FrontierEntry { url, key, depth });
        true
    }

    fn seed(&mut self, seed: &Url) {
        if !self.has_capacity() {
            ::log::warn!("Page cap is zero, nothing to crawl");
            return;
        }
        if !self.claim(seed.clone(), 0) {
            ::log::info!("Seed {} was visited by an earlier run, skipping it", seed);
        }
    }

    /// Queue URLs an earlier run skipped. Returns how many were queued.
    fn requeue(&mut self, skipped: &[String]) -> usize {
        let mut requeued = 0;
        for raw in skipped {
            let Ok(url) = Url::parse(raw) else {
                ::log::debug!("Ignoring unparsable skipped URL: {}", raw);
                continue;
            };
            if !self.filter.should_crawl(&url) {
                continue;
            }
            if !self.has_capacity() {
                self.record_skipped(&url);
                continue;
            }
            if self.depth_allows(1) && self.claim(url, 1) {
                requeued += 1;
            }
        }
        if requeued > 0 {
            ::log::info!("Re-queued {} URL(s) skipped by an earlier run", requeued);
        }
        requeued
    }

    fn depth_allows(&self, depth: usize) -> bool {
        depth <= self.config.max_depth
    }

    fn record_skipped(&mut self, url: &Url) {
        let mut url = url.clone();
        url.set_fragment(None);
        if self.skipped_seen.insert(normalize_url(&url)) {
            self.skipped.push(url.to_string());
        }
    }

    /// Per-page handler: errors are logged and the page is dropped
    fn handle(&mut self, entry: FrontierEntry, fetched: Result<FetchedPage, FetchError>) {
        self.visited_urls.push(entry.key.clone());

        match fetched {
            Ok(page) => self.process_page(&entry, page),
            Err(e) => ::log::warn!("Error crawling {}: {}", entry.url, e),
        }
    }

    fn process_page(&mut self, entry: &FrontierEntry, page: FetchedPage) {
        // Redirects may land on another host
        if !self.filter.is_in_domain_scope(&page.url) {
            ::log::debug!("Skipping {}: redirected out of scope to {}", entry.url, page.url);
            return;
        }

        let parser_type = ParserType::detect(page.url.as_str(), page.content_type.as_deref());
        if parser_type == ParserType::Other {
            ::log::debug!("Skipping non-text content at {}", entry.url);
            return;
        }

        let extracted = Parser::parse(&page.body, &page.url, parser_type, &self.extract);

        if self.boilerplate.admit(&extracted.content) {
            let result = self.build_result(entry, &extracted);
            if result.has_matches() {
                ::log::info!("Match on {} [depth {}]", entry.key, entry.depth);
                self.results.insert(result);
            }
        } else {
            ::log::debug!("Suppressing duplicate or empty content on {}", entry.key);
        }

        let next_depth = entry.depth + 1;
        if !parser_type.should_extract_links() || !self.depth_allows(next_depth) {
            return;
        }

        let mut propagated = 0;
        for link in &extracted.links {
            if !self.filter.should_crawl(&link.url) {
                ::log::trace!("URL filter rejected: {}", link.url);
                continue;
            }

            if self.seen.contains(&normalize_url(&link.url)) {
                continue;
            }

            if propagated >= self.config.max_links_per_page || !self.has_capacity() {
                self.record_skipped(&link.url);
                continue;
            }

            if self.claim(link.url.clone(), next_depth) {
                ::log::debug!("Queuing link for crawling: {}", link.url);
                propagated += 1;
            }
        }
    }

    fn build_result(&self, entry: &FrontierEntry, extracted: &ExtractedPage) -> PageResult {
        let matcher = self.matcher;
        let content = &extracted.content;

        let body_match = matcher.is_match(content).then(|| matcher.highlight(content));
        let head_match = matcher
            .is_match(&extracted.head_text)
            .then(|| matcher.highlight(&extracted.head_text));

        let snippets = if body_match.is_some() {
            let mut snippets = matcher.context_snippets(content, self.config.max_context_matches);
            snippets.truncate(self.config.max_snippets);
            snippets
        } else {
            Vec::new()
        };

        let href_matches = extracted
            .links
            .iter()
            .filter_map(|link| matcher.match_link(link, &entry.url))
            .collect();

        PageResult {
            url: entry.key.clone(),
            title: extracted.title.clone(),
            depth: entry.depth,
            matches: matcher.count(content),
            body_match,
            head_match,
            href_matches,
            snippets,
        }
    }

    fn into_report(self, requeued: usize, cancelled: bool) -> CrawlReport {
        let visited: HashSet<&String> = self.visited_urls.iter().collect();
        let skipped = self
            .skipped
            .into_iter()
            .filter(|raw| {
                Url::parse(raw)
                    .map(|u| !visited.contains(&normalize_url(&u)))
                    .unwrap_or(false)
            })
            .collect();

        CrawlReport {
            results: self.results.into_vec(),
            visited: self.visited_urls,
            skipped,
            requeued,
            cancelled,
        }
    }
}
