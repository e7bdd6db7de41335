//! Sentiment scoring and five-way categorization.
//!
//! A [`SentimentScorer`] turns text into a compound polarity score in
//! `[-1, 1]`; [`classify`] buckets that score into a [`SentimentCategory`]
//! with fixed thresholds. [`LexiconScorer`] is the built-in scorer: a
//! word-list model with negation, intensifier and emphasis handling and no
//! external ML dependencies.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// Five ordinal sentiment buckets. Declaration order is favorability order,
/// so `Worst < Bad < Neutral < Good < VeryGood`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SentimentCategory {
    Worst,
    Bad,
    Neutral,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
}

impl SentimentCategory {
    pub const ALL: [SentimentCategory; 5] = [
        SentimentCategory::VeryGood,
        SentimentCategory::Good,
        SentimentCategory::Neutral,
        SentimentCategory::Bad,
        SentimentCategory::Worst,
    ];

    /// Human-readable label, as written to the export.
    pub fn label(self) -> &'static str {
        match self {
            SentimentCategory::VeryGood => "Very Good",
            SentimentCategory::Good => "Good",
            SentimentCategory::Neutral => "Neutral",
            SentimentCategory::Bad => "Bad",
            SentimentCategory::Worst => "Worst",
        }
    }

    /// Console marker for progress lines.
    pub fn marker(self) -> &'static str {
        match self {
            SentimentCategory::VeryGood | SentimentCategory::Good => "[+]",
            SentimentCategory::Neutral => "[=]",
            SentimentCategory::Bad | SentimentCategory::Worst => "[-]",
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Produces a compound polarity score in `[-1, 1]`, most positive at `+1`.
///
/// Implementations must be deterministic for identical input within a run.
/// They are called one at a time and need not be thread-safe.
pub trait SentimentScorer {
    fn score(&self, text: &str) -> Result<f64, ScoringError>;
}

/// Maps a compound score to its category. Thresholds are checked top-down:
///
/// | score              | category |
/// |--------------------|----------|
/// | `c >= 0.5`         | VeryGood |
/// | `0.05 <= c < 0.5`  | Good     |
/// | `-0.05 < c < 0.05` | Neutral  |
/// | `-0.5 < c <= -0.05`| Bad      |
/// | `c <= -0.5`        | Worst    |
pub fn category_for_score(compound: f64) -> SentimentCategory {
    if compound >= 0.5 {
        SentimentCategory::VeryGood
    } else if compound >= 0.05 {
        SentimentCategory::Good
    } else if compound > -0.05 {
        SentimentCategory::Neutral
    } else if compound > -0.5 {
        SentimentCategory::Bad
    } else {
        SentimentCategory::Worst
    }
}

/// Classifies `text`. Blank text is `Neutral` and never reaches the scorer.
/// Scorer errors are returned as-is.
pub fn classify<S>(scorer: &S, text: &str) -> Result<SentimentCategory, ScoringError>
where
    S: SentimentScorer + ?Sized,
{
    if text.trim().is_empty() {
        return Ok(SentimentCategory::Neutral);
    }

    let compound = scorer.score(text)?;
    if !compound.is_finite() || !(-1.0..=1.0).contains(&compound) {
        return Err(ScoringError::OutOfRange(compound));
    }

    Ok(category_for_score(compound))
}

// ============================================================================
// Lexicon scorer
// ============================================================================

const STRONG: f64 = 3.0;
const MILD: f64 = 1.9;

// Empirical constants from the VADER family of lexicon scorers.
const NEGATION_SCALAR: f64 = -0.74;
const BOOST_INCREMENT: f64 = 0.293;
const CAPS_INCREMENT: f64 = 0.733;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NORMALIZATION_ALPHA: f64 = 15.0;

static STRONG_POSITIVE: &[&str] = &[
    "amazing", "excellent", "outstanding", "brilliant", "fantastic", "superb", "wonderful",
    "incredible", "magnificent", "exceptional", "perfect", "awesome", "love", "loved", "loving",
    "best", "phenomenal", "inspiring", "masterpiece",
];

static MILD_POSITIVE: &[&str] = &[
    "good", "great", "nice", "better", "positive", "happy", "joy", "joyful", "beautiful",
    "delightful", "pleasant", "satisfying", "satisfied", "recommend", "recommended", "impressive",
    "remarkable", "success", "successful", "win", "winner", "winning", "efficient", "effective",
    "helpful", "reliable", "trustworthy", "quality", "valuable", "beneficial", "favorable",
    "insightful", "useful", "congrats", "congratulations", "thanks", "thank", "agree", "well",
    "glad", "proud", "cool", "like", "liked", "enjoy", "enjoyed",
];

static MILD_NEGATIVE: &[&str] = &[
    "bad", "poor", "worse", "dislike", "disappointing", "disappointed", "disappoints", "failure",
    "failed", "fail", "failing", "negative", "sad", "unhappy", "angry", "annoyed", "frustrated",
    "frustrating", "problem", "problems", "issue", "issues", "broken", "wrong", "incorrect",
    "unreliable", "unstable", "slow", "difficult", "confusing", "expensive", "overpriced",
    "mediocre", "subpar", "inferior", "boring", "disagree", "misleading", "sorry",
];

static STRONG_NEGATIVE: &[&str] = &[
    "terrible", "awful", "horrible", "worst", "hate", "hated", "hating", "useless", "waste",
    "scam", "fraud", "fake", "worthless", "garbage", "trash", "rubbish", "pathetic", "disgusting",
    "disaster",
];

static NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "cannot", "isn't",
    "aren't", "wasn't", "weren't", "don't", "doesn't", "didn't", "can't", "won't", "wouldn't",
    "shouldn't", "couldn't", "hasn't", "haven't", "hadn't", "isnt", "dont", "doesnt", "didnt",
    "cant", "wont",
];

static BOOSTERS: &[&str] = &[
    "very", "really", "extremely", "so", "incredibly", "absolutely", "totally", "truly", "highly",
    "super", "completely", "especially",
];

static DAMPENERS: &[&str] = &["slightly", "somewhat", "kinda", "barely", "hardly", "marginally"];

static VALENCES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let tiers: [(&[&str], f64); 4] = [
        (STRONG_POSITIVE, STRONG),
        (MILD_POSITIVE, MILD),
        (MILD_NEGATIVE, -MILD),
        (STRONG_NEGATIVE, -STRONG),
    ];
    tiers
        .iter()
        .flat_map(|(words, valence)| words.iter().map(move |w| (*w, *valence)))
        .collect()
});

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z']*").expect("word pattern compiles"));

/// Word-list sentiment scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    /// Raw (unnormalized) valence sum of `text`.
    fn valence_sum(text: &str) -> f64 {
        let tokens: Vec<&str> = WORD.find_iter(text).map(|m| m.as_str()).collect();
        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

        let has_upper = tokens.iter().any(|t| is_shouting(t));
        let has_lower = tokens.iter().any(|t| !is_shouting(t));
        let caps_matter = has_upper && has_lower;

        let mut sum = 0.0;
        for (i, word) in lowered.iter().enumerate() {
            let Some(&base) = VALENCES.get(word.as_str()) else {
                continue;
            };
            let sign = base.signum();
            let mut valence = base;

            if caps_matter && is_shouting(tokens[i]) {
                valence += sign * CAPS_INCREMENT;
            }

            if let Some(prev) = i.checked_sub(1).map(|p| lowered[p].as_str()) {
                if BOOSTERS.contains(&prev) {
                    valence += sign * BOOST_INCREMENT;
                } else if DAMPENERS.contains(&prev) {
                    valence -= sign * BOOST_INCREMENT;
                }
            }

            let window = &lowered[i.saturating_sub(3)..i];
            if window.iter().any(|w| NEGATORS.contains(&w.as_str())) {
                valence *= NEGATION_SCALAR;
            }

            sum += valence;
        }

        if sum != 0.0 {
            let bangs = text.chars().filter(|c| *c == '!').count().min(MAX_EXCLAMATIONS);
            sum += sum.signum() * bangs as f64 * EXCLAMATION_INCREMENT;
        }

        sum
    }
}

fn is_shouting(token: &str) -> bool {
    token.len() > 1 && token.chars().all(|c| !c.is_lowercase())
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<f64, ScoringError> {
        let sum = Self::valence_sum(text);
        let compound = sum / (sum * sum + NORMALIZATION_ALPHA).sqrt();
        Ok(compound.clamp(-1.0, 1.0))
    }
}
