use clap::Parser;
use site_seeker::{CrawlRequest, Credentials, SearchOutcome, Searcher, matcher::strip_marks};
use tokio_util::sync::CancellationToken;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match args.search_config() {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let searcher = match Searcher::new(config) {
        Ok(searcher) => searcher,
        Err(e) => {
            ::log::error!("Failed to start searcher: {}", e);
            std::process::exit(2);
        }
    };

    if args.history_list {
        list_history(&searcher, args.json);
        return;
    }

    let (Some(url), Some(search_text)) = (args.url.clone(), args.search_text.clone()) else {
        ::log::error!("A URL and a search text are required");
        std::process::exit(2);
    };

    let mut request = CrawlRequest::new(url, search_text).with_skip_visited(!args.no_skip_visited);
    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        request = request.with_credentials(Credentials::new(username, password));
    }

    // Ctrl-C stops the crawl; partial results are still printed
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::warn!("Interrupted, finishing current batch");
            on_signal.cancel();
        }
    });

    let start_time = std::time::Instant::now();
    let outcome = searcher.search_with_cancel(&request, cancel).await;
    ::log::info!(
        "Search finished in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    if args.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => ::log::error!("Failed to serialize outcome: {}", e),
        }
    } else {
        print_outcome(&request.search_text, &outcome);
    }

    if !outcome.success {
        std::process::exit(1);
    }
}

fn print_outcome(search_text: &str, outcome: &SearchOutcome) {
    if let Some(error) = &outcome.error {
        eprintln!("Error: {}", error);
        return;
    }

    println!(
        "Found '{}' on {} of {} page(s){}{}",
        search_text,
        outcome.results.len(),
        outcome.total_pages_visited,
        if outcome.is_research {
            format!(", continued earlier search ({} re-queued)", outcome.skipped_count)
        } else {
            String::new()
        },
        if outcome.cancelled { ", cancelled" } else { "" }
    );

    for page in &outcome.results {
        println!();
        println!("[depth {}] {} - {}", page.depth, page.title, page.url);
        println!("  matches in text: {}", page.matches);
        if outcome.results.len() < 20 {
            for snippet in &page.snippets {
                println!("  {}", strip_marks(snippet));
            }
        }
        if page.head_match.is_some() {
            println!("  matched in page head");
        }
        for link in &page.href_matches {
            println!("  link: {} -> {}", strip_marks(&link.text), link.url);
        }
    }
}

fn list_history(searcher: &Searcher, json: bool) {
    let entries = match searcher.recent_searches() {
        Ok(entries) => entries,
        Err(e) => {
            ::log::error!("Cannot list history: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&entries) {
            Ok(out) => println!("{}", out),
            Err(e) => ::log::error!("Failed to serialize history: {}", e),
        }
        return;
    }

    for entry in entries {
        println!(
            "{}  '{}' on {}: {} result(s), {} URL(s) visited, {} skipped",
            entry.last_updated.format("%Y-%m-%d %H:%M:%S"),
            entry.search_text,
            entry.base_url,
            entry.results.len(),
            entry.total_urls,
            entry.skipped_urls.len()
        );
    }
}
