// Test doubles for the collector's collaborators.
//
// - FakeSurface (BrowsingSurface) : scripted per-pass node lists
// - FixedScorer (SentimentScorer) : text→score table with call counting
// - MemorySink / FailingSink (RecordSink) : capture or reject exports

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::cancel::CancelFlag;
use crate::error::{ExportError, ScoringError, SurfaceError};
use crate::export::RecordSink;
use crate::record::RetainedRecord;
use crate::sentiment::{SentimentCategory, SentimentScorer};
use crate::surface::{Author, BrowsingSurface, Extracted};

/// Record with a fixed profile link derived from the author.
pub fn record(author: &str, sentiment: SentimentCategory, text: &str) -> RetainedRecord {
    RetainedRecord {
        author: author.to_string(),
        sentiment,
        text: text.to_string(),
        profile_link: format!("https://example.com/in/{}", author.to_lowercase()),
        scraped_at: Local::now(),
    }
}

// ---------------------------------------------------------------------------
// FakeSurface
// ---------------------------------------------------------------------------

/// What `extract_text` / `extract_author` report for a fake node.
#[derive(Debug, Clone)]
pub struct FakeNode {
    pub text: Extracted<String>,
    pub author: Extracted<Author>,
}

/// Serves one scripted node list per `list_comment_nodes` call, then empty
/// lists. Failed listings do not consume a scripted list but do count
/// towards `die_after_passes`.
#[derive(Default)]
pub struct FakeSurface {
    passes: VecDeque<Vec<FakeNode>>,
    served: usize,
    die_after: Option<usize>,
    lose_on_list: bool,
    lose_on_expand: bool,
    lose_on_scroll: bool,
    flaky: bool,
    clicks: usize,
    cancel_on_expand: Option<CancelFlag>,
    transient_list_failures: usize,
    scrolls: Arc<AtomicUsize>,
    pub loaded: Vec<String>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(mut self, nodes: Vec<FakeNode>) -> Self {
        self.passes.push_back(nodes);
        self
    }

    /// `is_alive` turns false once this many node lists were served.
    pub fn die_after_passes(mut self, passes: usize) -> Self {
        self.die_after = Some(passes);
        self
    }

    pub fn lose_session_on_list(mut self) -> Self {
        self.lose_on_list = true;
        self
    }

    pub fn lose_session_on_expand(mut self) -> Self {
        self.lose_on_expand = true;
        self
    }

    pub fn lose_session_on_scroll(mut self) -> Self {
        self.lose_on_scroll = true;
        self
    }

    pub fn flaky_expand_and_scroll(mut self) -> Self {
        self.flaky = true;
        self
    }

    /// Every expansion reports `clicks` load-more controls clicked.
    pub fn expands(mut self, clicks: usize) -> Self {
        self.clicks = clicks;
        self
    }

    /// Sets `cancel` while expanding, i.e. just before the expand settle wait.
    pub fn cancel_on_expand(mut self, cancel: CancelFlag) -> Self {
        self.cancel_on_expand = Some(cancel);
        self
    }

    /// The first `times` listings fail with a transient error.
    pub fn transient_list_failures(mut self, times: usize) -> Self {
        self.transient_list_failures = times;
        self
    }

    /// Shared count of `scroll_forward` calls, readable after the surface
    /// moved into a collector.
    pub fn scroll_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.scrolls)
    }

    pub fn comment(author: &str, text: &str) -> FakeNode {
        FakeNode {
            text: Extracted::Found(text.to_string()),
            author: Extracted::Found(Author {
                name: author.to_string(),
                profile_link: format!("https://example.com/in/{}", author.to_lowercase()),
            }),
        }
    }

    pub fn anonymous(text: &str) -> FakeNode {
        FakeNode {
            text: Extracted::Found(text.to_string()),
            author: Extracted::Missing,
        }
    }

    pub fn textless() -> FakeNode {
        FakeNode {
            text: Extracted::Missing,
            author: Extracted::Missing,
        }
    }

    pub fn unreadable() -> FakeNode {
        FakeNode {
            text: Extracted::Failed("stale element".to_string()),
            author: Extracted::Failed("stale element".to_string()),
        }
    }
}

impl BrowsingSurface for FakeSurface {
    type Node = FakeNode;

    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.loaded.push(url.to_string());
        Ok(())
    }

    fn expand_pending_content(&mut self) -> Result<usize, SurfaceError> {
        if self.lose_on_expand {
            return Err(SurfaceError::SessionLost("window closed".to_string()));
        }
        if self.flaky {
            return Err(SurfaceError::Transient("click did not land".to_string()));
        }
        if let Some(cancel) = &self.cancel_on_expand {
            cancel.cancel();
        }
        Ok(self.clicks)
    }

    fn list_comment_nodes(&mut self) -> Result<Vec<FakeNode>, SurfaceError> {
        if self.lose_on_list {
            return Err(SurfaceError::SessionLost("tab closed".to_string()));
        }
        self.served += 1;
        if self.transient_list_failures > 0 {
            self.transient_list_failures -= 1;
            return Err(SurfaceError::Transient("node list script timed out".to_string()));
        }
        Ok(self.passes.pop_front().unwrap_or_default())
    }

    fn extract_text(&self, node: &FakeNode) -> Extracted<String> {
        node.text.clone()
    }

    fn extract_author(&self, node: &FakeNode) -> Extracted<Author> {
        node.author.clone()
    }

    fn scroll_forward(&mut self) -> Result<(), SurfaceError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        if self.lose_on_scroll {
            return Err(SurfaceError::SessionLost("window closed".to_string()));
        }
        if self.flaky {
            return Err(SurfaceError::Transient("scroll script timed out".to_string()));
        }
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        self.die_after.map_or(true, |limit| self.served < limit)
    }
}

// ---------------------------------------------------------------------------
// FixedScorer
// ---------------------------------------------------------------------------

/// Table-driven scorer. Unknown text scores the default, or fails if there
/// is none.
#[derive(Default)]
pub struct FixedScorer {
    scores: HashMap<String, f64>,
    default: Option<f64>,
    failures: RefCell<HashMap<String, usize>>,
    always_fail: Vec<String>,
    calls: Cell<usize>,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl FixedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, score: f64) -> Self {
        self.scores.insert(text.to_string(), score);
        self
    }

    pub fn with_default(mut self, score: f64) -> Self {
        self.default = Some(score);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.always_fail.push(text.to_string());
        self
    }

    /// Fails the first `times` calls for `text`, then scores normally.
    pub fn failing_times(self, text: &str, times: usize) -> Self {
        self.failures.borrow_mut().insert(text.to_string(), times);
        self
    }

    /// Sets `cancel` during the `call`-th scoring call.
    pub fn cancel_after(mut self, call: usize, cancel: CancelFlag) -> Self {
        self.cancel_after = Some((call, cancel));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl SentimentScorer for FixedScorer {
    fn score(&self, text: &str) -> Result<f64, ScoringError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if let Some((at, cancel)) = &self.cancel_after {
            if call == *at {
                cancel.cancel();
            }
        }

        if self.always_fail.iter().any(|t| t == text) {
            return Err(ScoringError::Failed(format!("cannot score {text:?}")));
        }
        if let Some(remaining) = self.failures.borrow_mut().get_mut(text) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ScoringError::Failed(format!("transient failure on {text:?}")));
            }
        }

        self.scores
            .get(text)
            .copied()
            .or(self.default)
            .ok_or_else(|| ScoringError::Failed(format!("no score for {text:?}")))
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

pub type Exports = Arc<Mutex<Vec<(Vec<RetainedRecord>, PathBuf)>>>;

/// Remembers every export instead of writing files.
#[derive(Default)]
pub struct MemorySink {
    exports: Exports,
}

impl MemorySink {
    pub fn handle(&self) -> Exports {
        Arc::clone(&self.exports)
    }
}

impl RecordSink for MemorySink {
    fn write(&self, records: &[RetainedRecord], path: &Path) -> Result<(), ExportError> {
        if let Ok(mut exports) = self.exports.lock() {
            exports.push((records.to_vec(), path.to_path_buf()));
        }
        Ok(())
    }
}

/// Always fails with a permission error.
#[derive(Default)]
pub struct FailingSink;

impl RecordSink for FailingSink {
    fn write(&self, _records: &[RetainedRecord], _path: &Path) -> Result<(), ExportError> {
        Err(ExportError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only output directory",
        )))
    }
}
