//! The incremental scrape loop.
//!
//! Each pass expands pending "load more" controls, reads every comment node
//! the page currently holds, runs new comments through identity, sentiment
//! and category filtering, then scrolls to surface more. The loop has no
//! natural end: it stops on cancellation, on loss of the browser session, or
//! when an optional pass limit runs out. Whatever stops it, the retained
//! records are exported exactly once before [`Collector::run`] returns.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::error::{ScoringError, SurfaceError};
use crate::export::{export_with_fallback, ExportOutcome, RecordSink};
use crate::filter::{should_retain, TargetSet};
use crate::identity::{identity_key, CommentKey};
use crate::record::{RawComment, RetainedRecord, UNKNOWN_AUTHOR};
use crate::sentiment::{classify, SentimentCategory, SentimentScorer};
use crate::surface::{Author, BrowsingSurface, Extracted};

const PREVIEW_CHARS: usize = 50;

/// Lifecycle of a collector run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorState {
    Running,
    /// Stopped by the operator.
    Cancelled,
    /// The browser went away.
    SessionLost { reason: String },
    /// The configured pass limit was reached.
    Completed,
}

impl fmt::Display for CollectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectorState::Running => f.write_str("running"),
            CollectorState::Cancelled => f.write_str("cancelled"),
            CollectorState::SessionLost { reason } => write!(f, "session lost ({reason})"),
            CollectorState::Completed => f.write_str("completed"),
        }
    }
}

/// Loop tuning.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub targets: TargetSet,
    /// Wait after "load more" controls were clicked.
    pub expand_settle: Duration,
    /// Wait after each scroll for lazy content to arrive.
    pub scroll_settle: Duration,
    /// Stop after this many passes. `None` runs until cancelled.
    pub max_passes: Option<u32>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            targets: TargetSet::All,
            expand_settle: Duration::from_secs(1),
            scroll_settle: Duration::from_secs(2),
            max_passes: None,
        }
    }
}

/// What happened to one extracted comment.
#[derive(Debug)]
pub enum Ingest {
    /// Identity key already seen this run.
    Duplicate,
    /// Scorer failed; the comment stays unseen and is retried next pass.
    ScoringFailed(ScoringError),
    /// Classified but not in the target set.
    FilteredOut(SentimentCategory),
    Retained(SentimentCategory),
}

/// Seen keys plus retained records for one run.
#[derive(Debug, Default)]
pub struct Ledger {
    targets: TargetSet,
    seen: HashSet<CommentKey>,
    records: Vec<RetainedRecord>,
}

impl Ledger {
    pub fn new(targets: TargetSet) -> Self {
        Self {
            targets,
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Identity check, classification, seen-marking and filtering for one
    /// comment, in that order.
    pub fn ingest<S>(&mut self, raw: RawComment, scorer: &S) -> Ingest
    where
        S: SentimentScorer + ?Sized,
    {
        let key = identity_key(&raw.author, &raw.text);
        if self.seen.contains(&key) {
            return Ingest::Duplicate;
        }

        let category = match classify(scorer, &raw.text) {
            Ok(category) => category,
            Err(e) => return Ingest::ScoringFailed(e),
        };

        self.seen.insert(key);

        if !should_retain(category, &self.targets) {
            return Ingest::FilteredOut(category);
        }

        info!(
            "{} {} | {}: {}...",
            category.marker(),
            category.label().to_uppercase(),
            raw.author,
            preview(&raw.text)
        );
        self.records.push(RetainedRecord::from_raw(raw, category, Local::now()));
        Ingest::Retained(category)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn records(&self) -> &[RetainedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RetainedRecord> {
        self.records
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Counters for one pass, handed to the progress callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub pass: u32,
    pub nodes: usize,
    /// Nodes without usable text.
    pub skipped: usize,
    pub duplicates: usize,
    pub scoring_failures: usize,
    pub filtered_out: usize,
    pub retained: usize,
    pub total_retained: usize,
}

/// Final result of [`Collector::run`].
#[derive(Debug)]
pub struct RunOutcome {
    pub state: CollectorState,
    pub passes: u32,
    /// Every retained record, in first-seen order. Kept even if export
    /// failed.
    pub records: Vec<RetainedRecord>,
    pub export: ExportOutcome,
}

enum PassEnd {
    Finished(PassReport),
    Stopped(CollectorState),
}

/// Drives a [`BrowsingSurface`] until stopped, then exports once.
pub struct Collector<B, S, E> {
    surface: B,
    scorer: S,
    sink: E,
    settings: CollectorSettings,
    cancel: CancelFlag,
    output: PathBuf,
    ledger: Ledger,
    passes: u32,
    loaded: bool,
}

impl<B, S, E> Collector<B, S, E>
where
    B: BrowsingSurface,
    S: SentimentScorer,
    E: RecordSink,
{
    pub fn new(
        surface: B,
        scorer: S,
        sink: E,
        settings: CollectorSettings,
        cancel: CancelFlag,
        output: PathBuf,
    ) -> Self {
        let ledger = Ledger::new(settings.targets.clone());
        Self {
            surface,
            scorer,
            sink,
            settings,
            cancel,
            output,
            ledger,
            passes: 0,
            loaded: false,
        }
    }

    /// Navigates the surface to the post. Must succeed before
    /// [`Collector::run`] starts any pass.
    pub fn load_post(&mut self, url: &str) -> Result<(), SurfaceError> {
        info!(url, "Loading post");
        self.surface.load_url(url)?;
        self.loaded = true;
        Ok(())
    }

    /// Runs passes until a terminal state, calling `on_progress` after each
    /// completed pass, then exports and returns.
    ///
    /// Without a successful [`Collector::load_post`] no pass runs and the
    /// run ends as [`CollectorState::SessionLost`].
    pub async fn run<F>(mut self, mut on_progress: F) -> RunOutcome
    where
        F: FnMut(&PassReport),
    {
        if !self.loaded {
            warn!("Collector started before the post was loaded");
            return self.finish(CollectorState::SessionLost {
                reason: "post was never loaded".to_string(),
            });
        }
        info!(targets = %self.settings.targets, "Collector started");

        let state = loop {
            if let Some(state) = self.stop_condition() {
                break state;
            }

            self.passes += 1;
            match self.run_pass().await {
                PassEnd::Finished(report) => {
                    debug!(?report, "Pass finished");
                    on_progress(&report);
                }
                PassEnd::Stopped(state) => break state,
            }
        };

        self.finish(state)
    }

    /// Checked before every pass. Cancellation wins over the other two.
    fn stop_condition(&mut self) -> Option<CollectorState> {
        if self.cancel.is_cancelled() {
            return Some(CollectorState::Cancelled);
        }
        if self.settings.max_passes.is_some_and(|max| self.passes >= max) {
            return Some(CollectorState::Completed);
        }
        if !self.surface.is_alive() {
            return Some(CollectorState::SessionLost {
                reason: "browser no longer responds".to_string(),
            });
        }
        None
    }

    async fn run_pass(&mut self) -> PassEnd {
        let mut report = PassReport {
            pass: self.passes,
            ..Default::default()
        };

        match self.surface.expand_pending_content() {
            Ok(0) => {}
            Ok(clicked) => {
                debug!(clicked, "Expanded pending comments");
                if self.cancel.sleep(self.settings.expand_settle).await {
                    return PassEnd::Stopped(CollectorState::Cancelled);
                }
            }
            Err(SurfaceError::SessionLost(reason)) => return session_lost(reason),
            Err(e) => debug!(error = %e, "Load-more expansion failed"),
        }

        let nodes = match self.surface.list_comment_nodes() {
            Ok(nodes) => nodes,
            Err(SurfaceError::SessionLost(reason)) => return session_lost(reason),
            Err(e) => {
                warn!(error = %e, "Could not list comment nodes");
                if !self.surface.is_alive() {
                    return session_lost(e.to_string());
                }
                Vec::new()
            }
        };
        report.nodes = nodes.len();

        for node in &nodes {
            if self.cancel.is_cancelled() {
                return PassEnd::Stopped(CollectorState::Cancelled);
            }

            let Some(raw) = self.read_node(node) else {
                report.skipped += 1;
                continue;
            };

            match self.ledger.ingest(raw, &self.scorer) {
                Ingest::Duplicate => report.duplicates += 1,
                Ingest::ScoringFailed(e) => {
                    debug!(error = %e, "Scoring failed, will retry next pass");
                    report.scoring_failures += 1;
                }
                Ingest::FilteredOut(_) => report.filtered_out += 1,
                Ingest::Retained(_) => report.retained += 1,
            }
        }

        match self.surface.scroll_forward() {
            Ok(()) => {}
            Err(SurfaceError::SessionLost(reason)) => return session_lost(reason),
            Err(e) => warn!(error = %e, "Scroll failed"),
        }
        if self.cancel.sleep(self.settings.scroll_settle).await {
            // The pass itself is done; the next stop check reports the cancel.
            debug!("Cancelled while waiting for content to settle");
        }

        report.total_retained = self.ledger.records().len();
        PassEnd::Finished(report)
    }

    /// Text is required; a missing author becomes [`UNKNOWN_AUTHOR`].
    fn read_node(&self, node: &B::Node) -> Option<RawComment> {
        let text = match self.surface.extract_text(node) {
            Extracted::Found(text) => text.trim().to_string(),
            Extracted::Missing => return None,
            Extracted::Failed(reason) => {
                debug!(reason = %reason, "Comment text unreadable");
                return None;
            }
        };
        if text.is_empty() {
            return None;
        }

        let Author { name, profile_link } = match self.surface.extract_author(node) {
            Extracted::Found(author) if !author.name.trim().is_empty() => author,
            Extracted::Failed(reason) => {
                debug!(reason = %reason, "Author unreadable");
                unknown_author()
            }
            _ => unknown_author(),
        };

        Some(RawComment::new(name, text, profile_link))
    }

    fn finish(self, state: CollectorState) -> RunOutcome {
        info!(
            state = %state,
            passes = self.passes,
            retained = self.ledger.records().len(),
            seen = self.ledger.seen_count(),
            "Collector stopped"
        );

        let export = export_with_fallback(&self.sink, self.ledger.records(), &self.output);

        RunOutcome {
            state,
            passes: self.passes,
            records: self.ledger.into_records(),
            export,
        }
    }
}

fn unknown_author() -> Author {
    Author {
        name: UNKNOWN_AUTHOR.to_string(),
        profile_link: String::new(),
    }
}

fn session_lost(reason: String) -> PassEnd {
    warn!(reason = %reason, "Browser session lost");
    PassEnd::Stopped(CollectorState::SessionLost { reason })
}
