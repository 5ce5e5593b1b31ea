//! Poll loop tuning.

use std::time::Duration;

/// Default delay between two status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Tunable parameters for a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Delay between ticks. The first tick fires immediately.
    pub poll_interval: Duration,
}

impl TrackerConfig {
    pub fn from_millis(poll_interval_ms: u64) -> Self {
        Self {
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::from_millis(DEFAULT_POLL_INTERVAL_MS)
    }
}
