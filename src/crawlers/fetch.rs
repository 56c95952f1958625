use crate::config::SearchConfig;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use regex::bytes::Regex;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// HTTP Basic-Auth credentials sent with every request of a crawl
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Errors that can occur while fetching a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Body of a successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the content was served from (after redirects)
    pub url: Url,
    /// Decoded body text
    pub body: String,
    /// Content-Type header, if any
    pub content_type: Option<String>,
}

/// Source of page content for the crawler
pub trait Fetch {
    /// Fetch one URL. Any error means "skip this page".
    fn fetch(
        &self,
        url: &Url,
        credentials: Option<&Credentials>,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the timeout and User-Agent from the config
    pub fn new(config: &SearchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Build the GET request for a URL, with Basic-Auth when credentials are given
    pub fn build_request(
        &self,
        url: &Url,
        credentials: Option<&Credentials>,
    ) -> Result<reqwest::Request, FetchError> {
        let mut request = self.client.get(url.as_str());
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }
        Ok(request.build()?)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(
        &self,
        url: &Url,
        credentials: Option<&Credentials>,
    ) -> Result<FetchedPage, FetchError> {
        let request = self.build_request(url, credentials)?;

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Http(e)
            }
        })?;

        Ok(FetchedPage {
            url: final_url,
            body: decode_body(&bytes, content_type.as_deref()),
            content_type,
        })
    }
}

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).expect("valid regex")
});

/// Decode a response body.
///
/// A charset from the Content-Type header is trusted unless it is the
/// single-byte latin-1 fallback; in that case (or with no charset at all)
/// the encoding is detected from the content: BOM, then `<meta charset>`,
/// then UTF-8 validity, then windows-1252.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    let encoding = match declared {
        Some(enc) if enc != WINDOWS_1252 => enc,
        _ => detect_encoding(bytes),
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        ::log::debug!("Body contained invalid {} sequences", used.name());
    }
    text.into_owned()
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c: char| c == '"' || c == '\''))
    })
}

fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((enc, _)) = Encoding::for_bom(bytes) {
        return enc;
    }

    let head = &bytes[..bytes.len().min(1024)];
    if let Some(enc) = META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        // A UTF-16 declaration inside ASCII-compatible markup cannot be right
        if enc == UTF_16LE || enc == UTF_16BE {
            return UTF_8;
        }
        return enc;
    }

    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}
