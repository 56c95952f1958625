pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use url::Url;

/// Enum to represent different types of content parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserType {
    /// HTML parser
    Html,
    /// Plain text parser
    Text,
    /// Content with nothing searchable in it (images, archives, ...)
    Other,
}

impl ParserType {
    /// Determines the parser type based on the URL or file path
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();

        if path.ends_with(".txt") || path.ends_with(".md") {
            ::log::trace!("Classifying as Text: {}", url);
            ParserType::Text
        } else if [".jpg", ".jpeg", ".png", ".gif", ".css", ".js", ".pdf", ".zip"]
            .iter()
            .any(|ext| path.ends_with(ext))
        {
            ::log::trace!("Classifying as Other: {}", url);
            ParserType::Other
        } else {
            ::log::trace!("Classifying as HTML: {}", url);
            ParserType::Html
        }
    }

    /// Determines the parser type from a Content-Type header, falling back to the URL
    pub fn detect(url: &str, content_type: Option<&str>) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("text/html") | Some("application/xhtml+xml") => ParserType::Html,
            Some("text/plain") => ParserType::Text,
            Some(m) if m.starts_with("image/") || m.starts_with("audio/") || m.starts_with("video/") => {
                ParserType::Other
            }
            Some("application/pdf") | Some("application/zip") | Some("application/octet-stream") => {
                ParserType::Other
            }
            _ => Self::from_url(url),
        }
    }

    /// Returns if the parser should extract links
    pub fn should_extract_links(&self) -> bool {
        matches!(self, ParserType::Html)
    }
}

/// Options for content extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Remove header/footer/nav/aside before choosing the main content
    pub strip_layout_tags: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strip_layout_tags: true,
        }
    }
}

/// An anchor found on a page, resolved against the page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Absolute http(s) URL
    pub url: Url,
    /// Visible anchor text, whitespace collapsed
    pub text: String,
}

/// Result of extracting a fetched page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Main content text, whitespace collapsed
    pub content: String,
    /// Document title, or the page URL when the document has none
    pub title: String,
    /// Text of the `<head>` element, whitespace collapsed
    pub head_text: String,
    /// Unique links in document order
    pub links: Vec<PageLink>,
}

/// Main parser that delegates to specific format parsers
pub struct Parser;

impl Parser {
    /// Parse content based on the parser type
    pub fn parse(
        content: &str,
        page_url: &Url,
        parser_type: ParserType,
        options: &ExtractOptions,
    ) -> ExtractedPage {
        match parser_type {
            ParserType::Html => html::parse(content, page_url, options),
            ParserType::Text => text::parse(content, page_url),
            ParserType::Other => ExtractedPage {
                title: page_url.to_string(),
                ..ExtractedPage::default()
            },
        }
    }
}

/// Collapse every whitespace run into a single space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
