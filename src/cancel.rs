//! Cooperative cancellation for the scrape loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::warn;

/// Longest stretch a settle wait sleeps without looking at the flag.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleeps for `duration`, waking early once the flag is set.
    /// Returns `true` if cancelled.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep((deadline - now).min(POLL_SLICE)).await;
        }
    }

    /// Spawns a task that sets the flag on the first Ctrl+C.
    pub fn cancel_on_ctrl_c(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    println!("\n\n!!! STOPPING SCRAPER (User Interrupt) !!!");
                    flag.cancel();
                }
                Err(e) => warn!(error = %e, "Could not listen for Ctrl+C"),
            }
        });
    }
}
