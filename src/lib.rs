//! Incremental comment crawler: scrape the comments of one post from a live
//! browser, score their sentiment, drop duplicates, keep the selected
//! categories and save them to CSV when the run stops.

pub mod browser;
pub mod cancel;
pub mod collector;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod identity;
pub mod record;
pub mod sentiment;
pub mod surface;

#[cfg(test)]
pub mod testing;

pub use cancel::CancelFlag;
pub use collector::{Collector, CollectorSettings, CollectorState, PassReport, RunOutcome};
pub use error::{ConfigError, ExportError, ScoringError, SurfaceError};
pub use filter::TargetSet;
pub use record::{RawComment, RetainedRecord};
pub use sentiment::{LexiconScorer, SentimentCategory, SentimentScorer};
