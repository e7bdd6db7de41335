//! Error types shared by the collector and its collaborators.

use thiserror::Error;

/// Failure reported by a browsing surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// A click that did not land, a stale node, a script that timed out.
    /// The collector logs it and carries on with the pass.
    #[error("transient browser failure: {0}")]
    Transient(String),

    /// The browser window or its DevTools connection is gone.
    #[error("browser session lost: {0}")]
    SessionLost(String),
}

/// Failure reported by a sentiment scorer.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scorer failed: {0}")]
    Failed(String),

    #[error("scorer returned {0}, outside [-1, 1]")]
    OutOfRange(f64),
}

/// Failure writing the retained records.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid start-up configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} selector `{selector}`: {reason}")]
    InvalidSelector {
        name: &'static str,
        selector: String,
        reason: String,
    },
}
