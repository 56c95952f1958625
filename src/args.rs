use clap::Parser;
use site_seeker::SearchConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-seeker")]
#[command(about = "Crawl a website and search its pages for a piece of text")]
#[command(version)]
pub struct Args {
    /// Page to start crawling from; only pages on the same host are visited
    #[arg(required_unless_present = "history_list")]
    pub url: Option<String>,

    /// Text to search for (case-insensitive, literal)
    #[arg(required_unless_present = "history_list")]
    pub search_text: Option<String>,

    /// Basic-Auth user name
    #[arg(short, long, requires = "password")]
    pub username: Option<String>,

    /// Basic-Auth password
    #[arg(short, long, requires = "username")]
    pub password: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum link depth from the start page
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Maximum number of pages to fetch
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Search history file
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Crawl from scratch even if this text was searched before
    #[arg(long)]
    pub no_skip_visited: bool,

    /// List recent searches and exit
    #[arg(long)]
    pub history_list: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Build the search configuration: file (or defaults), then flag overrides
    pub fn search_config(&self) -> Result<SearchConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_file(path)?,
            None => SearchConfig::default(),
        };

        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(history) = &self.history {
            config.history_path = Some(history.clone());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "site-seeker",
            "http://example.test/",
            "widget",
            "--max-depth",
            "1",
            "--history",
            "h.json",
        ])
        .unwrap();

        let config = args.search_config().unwrap();
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.history_path, Some(PathBuf::from("h.json")));
        assert_eq!(args.search_text.as_deref(), Some("widget"));
    }

    #[test]
    fn test_history_list_needs_no_url() {
        let args = Args::try_parse_from(["site-seeker", "--history-list"]).unwrap();
        assert!(args.history_list);
        assert!(args.url.is_none());

        assert!(Args::try_parse_from(["site-seeker"]).is_err());
    }

    #[test]
    fn test_username_requires_password() {
        assert!(
            Args::try_parse_from(["site-seeker", "http://example.test/", "x", "--username", "u"])
                .is_err()
        );
    }
}
