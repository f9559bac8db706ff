//! Graceful Shutdown Signal
//!
//! A one-shot broadcast flag shared by the accept loop, every connection
//! worker and whoever asked for the shutdown (a Ctrl+C handler, a test).
//!
//! Once triggered the flag stays set: late observers see it immediately and
//! waiters never miss it, since [`Shutdown::wait`] checks the current value
//! before suspending.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Handle to a shared shutdown signal.
///
/// Cloning is cheap; every clone observes and triggers the same signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Creates a signal that has not been triggered.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests shutdown. Triggering more than once has no further effect.
    pub fn trigger(&self) {
        let was_triggered = self.tx.send_replace(true);
        if !was_triggered {
            debug!("Shutdown signal triggered");
        }
    }

    /// Returns `true` once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes when shutdown has been requested.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
