//! Reconnect Policy
//!
//! Delay before attempt `n` is `base_delay * n`. The growth is linear on
//! purpose; see DESIGN.md before changing it.

use std::time::Duration;

/// Bounds and pacing for automatic reconnects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 2_000;

    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Delay to wait before reconnect attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// The attempt number to run next, or `None` once the budget is spent
    pub fn next_attempt(&self, attempts_so_far: u32) -> Option<u32> {
        (attempts_so_far < self.max_attempts).then_some(attempts_so_far + 1)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(Self::DEFAULT_BASE_DELAY_MS),
            Self::DEFAULT_MAX_ATTEMPTS,
        )
    }
}
