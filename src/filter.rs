use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Asset extensions that are never worth fetching for a text search
pub const DEFAULT_EXCLUDE_PATTERN: &str =
    r"(?i)\.(jpg|jpeg|png|gif|webp|bmp|css|js|ico|svg|woff|woff2|ttf|eot|pdf|zip|gz|mp3|mp4|avi|mov)$";

/// Configuration for URL filtering in crawlers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Host every crawled URL must have (exact match, no suffix matching)
    pub required_host: String,

    /// Port every crawled URL must have; only set when the seed names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_port: Option<u16>,

    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl UrlFilterConfig {
    /// Scope a filter to the host of the seed URL.
    ///
    /// The scheme is not part of the scope, so `http` and `https` pages of
    /// the same host are both crawled. A port is only enforced when the seed
    /// spells one out.
    pub fn for_seed(seed: &Url) -> Self {
        Self {
            required_host: seed.host_str().unwrap_or_default().to_string(),
            required_port: seed.port(),
            include_patterns: Vec::new(),
            exclude_patterns: vec![DEFAULT_EXCLUDE_PATTERN.to_string()],
        }
    }
}

/// URL filter that keeps a crawl on the seed's host and applies regex rules
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let include_regexes = config
            .include_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            include_regexes,
            exclude_regexes,
        })
    }

    /// Determine if a URL should be crawled based on all filtering rules
    pub fn should_crawl(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        if !self.is_in_domain_scope(url) {
            return false;
        }

        // Exclusions take precedence
        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|r| r.is_match(url_str))
    }

    /// Check if a URL is on exactly the required host (and port, if one is required)
    pub fn is_in_domain_scope(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };

        if !host.eq_ignore_ascii_case(&self.config.required_host) {
            return false;
        }

        match self.config.required_port {
            Some(port) => url.port_or_known_default() == Some(port),
            None => true,
        }
    }
}

/// Canonical string form used for visited-set and result keys:
/// fragment removed, trailing slash stripped.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.as_str().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_filter(seed: &str) -> UrlFilter {
        UrlFilter::new(UrlFilterConfig::for_seed(&Url::parse(seed).unwrap())).unwrap()
    }

    #[test]
    fn test_default_filter_excludes_assets() {
        let filter = seed_filter("https://example.com/");

        let image_url = Url::parse("https://example.com/image.JPG").unwrap();
        assert!(!filter.should_crawl(&image_url));

        let html_url = Url::parse("https://example.com/page.html").unwrap();
        assert!(filter.should_crawl(&html_url));
    }

    #[test]
    fn test_domain_restriction_is_exact() {
        let filter = seed_filter("https://example.com/start");

        let correct = Url::parse("https://example.com/page").unwrap();
        assert!(filter.should_crawl(&correct));

        let other = Url::parse("https://other.com/page").unwrap();
        assert!(!filter.should_crawl(&other));

        // Subdomains are different hosts
        let sub = Url::parse("https://blog.example.com/page").unwrap();
        assert!(!filter.should_crawl(&sub));

        let suffix = Url::parse("https://notexample.com/page").unwrap();
        assert!(!filter.should_crawl(&suffix));
    }

    #[test]
    fn test_scheme_switch_stays_in_scope() {
        let filter = seed_filter("http://example.com/");

        let https = Url::parse("https://example.com/docs").unwrap();
        assert!(filter.should_crawl(&https));

        let explicit_default = Url::parse("http://example.com:80/page").unwrap();
        assert!(filter.should_crawl(&explicit_default));

        let mail = Url::parse("mailto:someone@example.com").unwrap();
        assert!(!filter.should_crawl(&mail));

        let https_seed = seed_filter("https://example.com/");
        let http = Url::parse("http://example.com/page").unwrap();
        assert!(https_seed.should_crawl(&http));
    }

    #[test]
    fn test_explicit_seed_port_is_enforced() {
        let filter = seed_filter("http://example.com:8080/");

        let same_port = Url::parse("http://example.com:8080/page").unwrap();
        assert!(filter.should_crawl(&same_port));

        let default_port = Url::parse("http://example.com/page").unwrap();
        assert!(!filter.should_crawl(&default_port));

        let https = Url::parse("https://example.com/page").unwrap();
        assert!(!filter.should_crawl(&https));
    }

    #[test]
    fn test_regex_patterns() {
        let mut config = UrlFilterConfig::for_seed(&Url::parse("https://example.com/").unwrap());
        config.include_patterns = vec![r"/docs/".to_string()];
        config.exclude_patterns.push(r"/docs/draft/".to_string());
        let filter = UrlFilter::new(config).unwrap();

        let included = Url::parse("https://example.com/docs/page.html").unwrap();
        assert!(filter.should_crawl(&included));

        let not_included = Url::parse("https://example.com/blog/post").unwrap();
        assert!(!filter.should_crawl(&not_included));

        let excluded = Url::parse("https://example.com/docs/draft/page.html").unwrap();
        assert!(!filter.should_crawl(&excluded));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let mut config = UrlFilterConfig::for_seed(&Url::parse("https://example.com/").unwrap());
        config.exclude_patterns.push("(unclosed".to_string());
        assert!(UrlFilter::new(config).is_err());
    }

    #[test]
    fn test_normalize_url() {
        let url = Url::parse("http://example.test/").unwrap();
        assert_eq!(normalize_url(&url), "http://example.test");

        let url = Url::parse("http://example.test/docs/#intro").unwrap();
        assert_eq!(normalize_url(&url), "http://example.test/docs");

        let url = Url::parse("http://example.test/a?b=1").unwrap();
        assert_eq!(normalize_url(&url), "http://example.test/a?b=1");
    }
}
