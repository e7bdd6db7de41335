use std::io::Write;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use comment_crawler::browser::ChromeSurface;
use comment_crawler::config::CrawlerConfig;
use comment_crawler::export::{output_path, CsvExporter, ExportOutcome};
use comment_crawler::{CancelFlag, Collector, LexiconScorer};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = CrawlerConfig::parse();
    let markup = config.markup()?;
    let settings = config.collector_settings();

    println!("========================================");
    println!("   COMMENT SENTIMENT CRAWLER");
    println!("========================================");

    let surface = ChromeSurface::launch(config.browser_options(), markup)?;
    let output = output_path(&config.output_dir, &config.output_prefix, &settings.targets, Local::now());

    let cancel = CancelFlag::new();
    println!("\nCollecting '{}' comments from {}", settings.targets, config.post_url);
    println!("---------------------------------------------------------------");
    println!("  !!! PRESS CTRL+C AT ANY TIME TO STOP AND SAVE !!!");
    println!("---------------------------------------------------------------");

    let mut collector = Collector::new(surface, LexiconScorer::new(), CsvExporter, settings, cancel.clone(), output);
    if let Err(e) = collector.load_post(&config.post_url) {
        eprintln!("❌ Could not open post: {}", e);
        return Ok(ExitCode::FAILURE);
    }
    cancel.cancel_on_ctrl_c();

    let outcome = collector
        .run(|report| {
            eprint!(
                "\rTotal Collected: {} | Pass {} | Scanning... (Press Ctrl+C to save)",
                report.total_retained, report.pass
            );
            let _ = std::io::stderr().flush();
        })
        .await;

    println!("\n\nStopped: {} after {} passes.", outcome.state, outcome.passes);
    match &outcome.export {
        ExportOutcome::Written(path) => {
            println!("✅ Saved {} comments to '{}'", outcome.records.len(), path.display());
        }
        ExportOutcome::FallbackWritten { primary_error, fallback } => {
            eprintln!("❌ Error saving file: {}", primary_error);
            println!("⚠️ {} comments dumped to '{}' instead", outcome.records.len(), fallback.display());
        }
        ExportOutcome::Failed { primary_error, fallback_error } => {
            eprintln!("❌ Error saving file: {}", primary_error);
            eprintln!("❌ Fallback dump failed: {}", fallback_error);
            eprintln!("⚠️ {} collected comments could not be saved", outcome.records.len());
        }
    }

    if outcome.export.written_path().is_some() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
