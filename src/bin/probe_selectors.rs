//! Opens a post, lets it settle, and reports what the configured selectors
//! find. Useful when the page markup changes and the crawler stops seeing
//! comments.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tokio::time::sleep;

use comment_crawler::browser::ChromeSurface;
use comment_crawler::config::CrawlerConfig;
use comment_crawler::identity::identity_key;
use comment_crawler::record::UNKNOWN_AUTHOR;
use comment_crawler::sentiment::classify;
use comment_crawler::surface::{BrowsingSurface, Extracted};
use comment_crawler::LexiconScorer;

const SAMPLE: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = CrawlerConfig::parse();
    let markup = config.markup()?;
    println!("🕵️ Probing selectors on {}", config.post_url);
    println!("   node:      {}", config.node_selector);
    println!("   text:      {}", config.text_selector);
    println!("   author:    {}", config.author_selector);
    println!("   load more: {}", config.load_more_selector);

    let mut surface = ChromeSurface::launch(config.browser_options(), markup)?;
    surface.load_url(&config.post_url)?;
    sleep(Duration::from_millis(config.scroll_settle_ms)).await;

    let expanded = surface.expand_pending_content()?;
    println!("\nLoad-more controls clicked: {}", expanded);
    if expanded > 0 {
        sleep(Duration::from_millis(config.expand_settle_ms)).await;
    }

    let nodes = surface.list_comment_nodes()?;
    let mut with_text = 0;
    let mut with_author = 0;
    for node in &nodes {
        if matches!(surface.extract_text(node), Extracted::Found(ref t) if !t.is_empty()) {
            with_text += 1;
        }
        if matches!(surface.extract_author(node), Extracted::Found(_)) {
            with_author += 1;
        }
    }
    println!("Comment nodes: {} ({} with text, {} with author)", nodes.len(), with_text, with_author);

    let scorer = LexiconScorer::new();
    println!("\nFirst {} readable comments:", SAMPLE);
    let readable = nodes
        .iter()
        .filter_map(|n| surface.extract_text(n).found().map(|t| (n, t)))
        .filter(|(_, t)| !t.is_empty())
        .take(SAMPLE);
    for (node, text) in readable {
        let author = surface
            .extract_author(node)
            .found()
            .map(|a| a.name)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let category = classify(&scorer, &text)?;
        println!("  {} {} | {} | key={}", category.marker(), category, author, identity_key(&author, &text));
        println!("      {}", text.chars().take(80).collect::<String>());
    }

    Ok(())
}
