use crate::parsers::{ExtractOptions, Parser, ParserType};
use url::Url;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_parser_type() {
        let url = Url::parse("https://example.org/page").unwrap();

        let html_content = "<html><body><p>Hello, world!</p><a href=\"https://example.com\">Link</a></body></html>";
        let result = Parser::parse(html_content, &url, ParserType::Html, &ExtractOptions::default());
        assert_eq!(result.content, "Hello, world! Link");
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].url.as_str(), "https://example.com/");

        let text_content = "Line 1\nLine 2\n\n  Line 3";
        let result = Parser::parse(text_content, &url, ParserType::Text, &ExtractOptions::default());
        assert_eq!(result.content, "Line 1 Line 2 Line 3");
        assert_eq!(result.title, "https://example.org/page");
        assert!(result.links.is_empty());

        let result = Parser::parse("\u{89}PNG", &url, ParserType::Other, &ExtractOptions::default());
        assert!(result.content.is_empty());
    }

    #[test]
    fn test_different_file_extensions() {
        let types = [
            ("file.txt", ParserType::Text),
            ("file.html", ParserType::Html),
            ("README.MD", ParserType::Text),
            ("file.pdf", ParserType::Other),
            ("file.jpg?size=large", ParserType::Other),
            ("https://example.org/page", ParserType::Html),
        ];

        for (url, expected_type) in types {
            assert_eq!(
                ParserType::from_url(url),
                expected_type,
                "URL '{}' should be parsed as {:?}",
                url,
                expected_type
            );
        }
    }

    #[test]
    fn test_content_type_wins_over_extension() {
        assert_eq!(
            ParserType::detect("https://example.org/notes.txt", Some("text/html; charset=utf-8")),
            ParserType::Html
        );
        assert_eq!(
            ParserType::detect("https://example.org/page", Some("text/plain")),
            ParserType::Text
        );
        assert_eq!(
            ParserType::detect("https://example.org/page", Some("image/png")),
            ParserType::Other
        );
        assert_eq!(
            ParserType::detect("https://example.org/page.txt", None),
            ParserType::Text
        );
        assert!(ParserType::Html.should_extract_links());
        assert!(!ParserType::Text.should_extract_links());
    }
}
