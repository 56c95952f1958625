use crate::parsers::html;
use crate::parsers::ExtractOptions;
use url::Url;

#[cfg(test)]
mod extraction_tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("http://example.test/section/page").unwrap()
    }

    #[test]
    fn test_scripts_and_styles_removed() {
        let doc = r#"<html><head><style>body { color: red }</style></head>
            <body><script>var secret = "needle";</script><p>Visible text</p></body></html>"#;
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "Visible text");
        assert!(!page.head_text.contains("color"));
    }

    #[test]
    fn test_whitespace_collapsed() {
        let doc = "<body><p>  Lots \n\n of\t\tspace  </p></body>";
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "Lots of space");
    }

    #[test]
    fn test_title_and_fallback() {
        let doc = "<html><head><title>  My   Page </title></head><body>x</body></html>";
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.title, "My Page");
        assert_eq!(page.head_text, "My Page");

        let page = html::parse("<body>x</body>", &page_url(), &ExtractOptions::default());
        assert_eq!(page.title, "http://example.test/section/page");
    }

    #[test]
    fn test_main_content_preferred() {
        let doc = r#"<body>
            <div class="sidebar">Sidebar stuff</div>
            <main><p>Main story</p></main>
        </body>"#;
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "Main story");
    }

    #[test]
    fn test_empty_candidate_skipped() {
        let doc = r#"<body>
            <main>   </main>
            <div id="content">Real content</div>
        </body>"#;
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "Real content");
    }

    #[test]
    fn test_layout_tags_stripped_optionally() {
        let doc = r#"<body>
            <header>Site header</header>
            <nav><a href="/a">Home</a></nav>
            <p>Body text</p>
            <footer>Copyright</footer>
        </body>"#;

        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "Body text");
        // Nav links remain crawlable
        assert_eq!(page.links.len(), 1);

        let keep = ExtractOptions {
            strip_layout_tags: false,
        };
        let page = html::parse(doc, &page_url(), &keep);
        assert_eq!(page.content, "Site header Home Body text Copyright");
    }

    #[test]
    fn test_links_resolved_filtered_and_unique() {
        let doc = r#"<body>
            <a href="/docs">Docs</a>
            <a href="../about">About   us</a>
            <a href="https://other.test/x">Other</a>
            <a href="/docs">Docs again</a>
            <a href="mailto:me@example.test">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a>No href</a>
        </body>"#;
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());

        let urls: Vec<&str> = page.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://example.test/docs",
                "http://example.test/about",
                "https://other.test/x",
            ]
        );
        assert_eq!(page.links[0].text, "Docs");
        assert_eq!(page.links[1].text, "About us");
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let doc = "<html><body><div><p>Unclosed <b>tags <i>everywhere";
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "Unclosed tags everywhere");

        let page = html::parse("", &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "");
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let doc = r#"<body><p>Blue <b>Wid</b>gets on <em>sa</em>le</p><a href="/w">Wid<span>get</span></a></body>"#;
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "Blue Widgets on sale Widget");
        assert_eq!(page.links[0].text, "Widget");
    }

    #[test]
    fn test_block_elements_separate_words() {
        let doc = "<body><ul><li>one</li><li>two</li></ul><div>three<br>four</div>five</body>";
        let page = html::parse(doc, &page_url(), &ExtractOptions::default());
        assert_eq!(page.content, "one two three four five");
    }
}
