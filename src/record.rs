use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::sentiment::SentimentCategory;

/// Author name used when a node has no readable author element.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One (author, text, profile link) tuple read off the page during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment {
    pub author: String,
    pub text: String,
    pub profile_link: String,
}

impl RawComment {
    pub fn new(author: impl Into<String>, text: impl Into<String>, profile_link: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            profile_link: profile_link.into(),
        }
    }
}

/// A comment that passed deduplication and the category filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainedRecord {
    pub author: String,
    pub sentiment: SentimentCategory,
    pub text: String,
    pub profile_link: String,
    pub scraped_at: DateTime<Local>,
}

impl RetainedRecord {
    pub fn from_raw(raw: RawComment, sentiment: SentimentCategory, scraped_at: DateTime<Local>) -> Self {
        Self {
            author: raw.author,
            sentiment,
            text: raw.text,
            profile_link: raw.profile_link,
            scraped_at,
        }
    }
}
