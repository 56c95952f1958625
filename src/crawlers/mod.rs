pub mod fetch;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{Credentials, Fetch, FetchError, FetchedPage, HttpFetcher};
pub use web::{CrawlReport, Crawler, Resume};
