use crate::crawlers::fetch::{Credentials, Fetch, FetchError, FetchedPage};
use crate::filter::normalize_url;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

/// In-memory site served through the `Fetch` trait.
/// Unknown URLs answer with a 404 error.
#[derive(Default)]
pub struct StaticSite {
    pages: HashMap<String, (String, String)>,
    redirects: HashMap<String, Url>,
    requests: Mutex<Vec<Url>>,
    credentials: Mutex<Vec<Option<Credentials>>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.with_content(url, "text/html; charset=utf-8", html)
    }

    pub fn text_page(self, url: &str, text: &str) -> Self {
        self.with_content(url, "text/plain", text)
    }

    pub fn with_content(mut self, url: &str, content_type: &str, body: &str) -> Self {
        let key = normalize_url(&Url::parse(url).unwrap());
        self.pages
            .insert(key, (content_type.to_string(), body.to_string()));
        self
    }

    /// Answer requests for `from` with the content of `to`, as a followed redirect would
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        let key = normalize_url(&Url::parse(from).unwrap());
        self.redirects.insert(key, Url::parse(to).unwrap());
        self
    }

    /// Cancel `token` once `requests` fetches have been made
    pub fn cancel_after(mut self, requests: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((requests, token));
        self
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }

    /// Credentials seen with each request
    pub fn credentials(&self) -> Vec<Option<Credentials>> {
        self.credentials.lock().unwrap().clone()
    }
}

impl Fetch for StaticSite {
    async fn fetch(&self, url: &Url, credentials: Option<&Credentials>) -> Result<FetchedPage, FetchError> {
        let made = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(url.clone());
            requests.len()
        };
        self.credentials.lock().unwrap().push(credentials.cloned());

        if let Some((after, token)) = &self.cancel_after {
            if made >= *after {
                token.cancel();
            }
        }

        let final_url = self
            .redirects
            .get(&normalize_url(url))
            .cloned()
            .unwrap_or_else(|| url.clone());

        match self.pages.get(&normalize_url(&final_url)) {
            Some((content_type, body)) => Ok(FetchedPage {
                url: final_url,
                body: body.clone(),
                content_type: Some(content_type.clone()),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
