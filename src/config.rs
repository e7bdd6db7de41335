//! Command-line / environment configuration.
//!
//! Every option can come from a flag or from the environment (a `.env` file
//! is loaded first by the binaries).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::browser::{
    BrowserOptions, CommentMarkup, DEFAULT_AUTHOR_SELECTOR, DEFAULT_LOAD_MORE_SELECTOR, DEFAULT_NODE_SELECTOR,
    DEFAULT_TEXT_SELECTOR,
};
use crate::collector::CollectorSettings;
use crate::error::ConfigError;
use crate::filter::TargetSet;

#[derive(Debug, Clone, Parser)]
#[command(name = "comment-crawler", version, about = "Scrape, score and filter the comments of one post")]
pub struct CrawlerConfig {
    /// URL of the post whose comments are collected.
    #[arg(env = "POST_URL")]
    pub post_url: String,

    /// Categories to keep: ALL, menu numbers (1 Very Good, 2 Good, 3 Bad,
    /// 4 Worst, 5 ALL) or names such as "very good,neutral".
    #[arg(short, long, env = "TARGET_CATEGORIES", default_value = "ALL")]
    pub targets: String,

    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, env = "OUTPUT_PREFIX", default_value = "comments")]
    pub output_prefix: String,

    #[arg(long, env = "HEADLESS", default_value_t = false)]
    pub headless: bool,

    /// Chrome user data directory to reuse (keeps an existing login).
    #[arg(long, env = "CHROME_PROFILE_DIR")]
    pub chrome_profile_dir: Option<PathBuf>,

    #[arg(long, env = "COMMENT_NODE_SELECTOR", default_value = DEFAULT_NODE_SELECTOR)]
    pub node_selector: String,

    #[arg(long, env = "COMMENT_TEXT_SELECTOR", default_value = DEFAULT_TEXT_SELECTOR)]
    pub text_selector: String,

    #[arg(long, env = "COMMENT_AUTHOR_SELECTOR", default_value = DEFAULT_AUTHOR_SELECTOR)]
    pub author_selector: String,

    #[arg(long, env = "LOAD_MORE_SELECTOR", default_value = DEFAULT_LOAD_MORE_SELECTOR)]
    pub load_more_selector: String,

    #[arg(long, env = "SCROLL_STEP_PX", default_value_t = 500)]
    pub scroll_step_px: u32,

    #[arg(long, env = "SCROLL_SETTLE_MS", default_value_t = 2000)]
    pub scroll_settle_ms: u64,

    #[arg(long, env = "EXPAND_SETTLE_MS", default_value_t = 1000)]
    pub expand_settle_ms: u64,

    #[arg(long, env = "PAGE_LOAD_TIMEOUT_SECS", default_value_t = 15)]
    pub page_load_timeout_secs: u64,

    /// Stop after this many passes instead of running until Ctrl+C.
    #[arg(long, env = "MAX_PASSES")]
    pub max_passes: Option<u32>,
}

impl CrawlerConfig {
    pub fn target_set(&self) -> TargetSet {
        TargetSet::parse(&self.targets)
    }

    pub fn markup(&self) -> Result<CommentMarkup, ConfigError> {
        CommentMarkup::new(
            &self.node_selector,
            &self.text_selector,
            &self.author_selector,
            &self.load_more_selector,
        )
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.headless,
            user_data_dir: self.chrome_profile_dir.clone(),
            page_load_timeout: Duration::from_secs(self.page_load_timeout_secs),
            scroll_step_px: self.scroll_step_px,
            ..Default::default()
        }
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            targets: self.target_set(),
            expand_settle: Duration::from_millis(self.expand_settle_ms),
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
            max_passes: self.max_passes,
        }
    }
}
