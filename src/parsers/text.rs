use crate::parsers::{ExtractedPage, collapse_whitespace};
use url::Url;

/// Parses plain text content (no links, no head)
///
/// The whole document is the main content and, lacking a title element,
/// the page URL stands in as the title.
pub fn parse(text: &str, page_url: &Url) -> ExtractedPage {
    ExtractedPage {
        content: collapse_whitespace(text),
        title: page_url.to_string(),
        head_text: String::new(),
        links: Vec::new(),
    }
}
