use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wait between a settled reaction and the feed invalidation.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Reconciler tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Milliseconds to wait after a reaction settles before raising
    /// `FeedInvalidated`, so the server's read side has caught up.
    pub settle_delay_ms: u64,
}

impl ReconcilerConfig {
    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}
