use crate::parsers::{ExtractOptions, ExtractedPage, PageLink, collapse_whitespace};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static SCRIPT_STYLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style, noscript, template").expect("valid selector"));

static LAYOUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("header, footer, nav, aside").expect("valid selector"));

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

static HEAD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("head").expect("valid selector"));

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Main content candidates, most specific first
static MAIN_CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "main",
        "[role=\"main\"]",
        "article",
        "#main-content",
        ".main-content",
        "#content",
        ".content",
        ".post-content",
        ".entry-content",
        ".article-body",
    ]
    .iter()
    .filter_map(|css| Selector::parse(css).ok())
    .collect()
});

/// Parses HTML content into main text, title, head text and links.
///
/// Parsing is best-effort: malformed markup never fails, missing
/// elements just produce empty values.
pub fn parse(html: &str, page_url: &Url, options: &ExtractOptions) -> ExtractedPage {
    let mut doc = Html::parse_document(html);

    remove_matching(&mut doc, &SCRIPT_STYLE);

    let title = doc
        .root_element()
        .select(&TITLE)
        .next()
        .map(|t| element_text(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| page_url.to_string());

    let head_text = doc
        .root_element()
        .select(&HEAD)
        .next()
        .map(|h| element_text(&h))
        .unwrap_or_default();

    // Navigation links stay crawlable even when layout tags are stripped below
    let links = extract_links(&doc, page_url);

    if options.strip_layout_tags {
        remove_matching(&mut doc, &LAYOUT);
    }

    let content = main_content(&doc);

    ::log::debug!(
        "HTML parser extracted {} chars and {} links from {}",
        content.len(),
        links.len(),
        page_url
    );

    ExtractedPage {
        content,
        title,
        head_text,
        links,
    }
}

/// Detaches every element matched by `selector` from the document tree
fn remove_matching(doc: &mut Html, selector: &Selector) {
    let ids: Vec<_> = doc.root_element().select(selector).map(|e| e.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Elements whose boundaries separate words
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

fn is_block(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| BLOCK_TAGS.contains(&e.name()))
}

/// Visible text of an element. Inline markup joins its text without a
/// separator; block elements start a new word.
fn element_text(element: &ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        if is_block(node.value()) || node.prev_sibling().is_some_and(|s| is_block(s.value())) {
            text.push(' ');
        }
        if let Some(t) = node.value().as_text() {
            text.push_str(t);
        }
    }
    collapse_whitespace(&text)
}

/// First non-empty main content candidate, then the body, then everything
fn main_content(doc: &Html) -> String {
    let root = doc.root_element();

    for selector in MAIN_CONTENT.iter() {
        if let Some(text) = root
            .select(selector)
            .map(|e| element_text(&e))
            .find(|t| !t.is_empty())
        {
            return text;
        }
    }

    match root.select(&BODY).next() {
        Some(body) => element_text(&body),
        None => element_text(&root),
    }
}

fn extract_links(doc: &Html, page_url: &Url) -> Vec<PageLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in doc.root_element().select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let Ok(url) = page_url.join(href.trim()) else {
            ::log::trace!("Unresolvable href on {}: {}", page_url, href);
            continue;
        };

        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }

        if seen.insert(url.as_str().to_string()) {
            links.push(PageLink {
                url,
                text: element_text(&anchor),
            });
        }
    }

    links
}
