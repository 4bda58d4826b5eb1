//! # Requeue Backoff
//!
//! Fibonacci backoff for requeueing failed reconciliations, counted in minutes:
//! 1m, 1m, 2m, 3m, 5m, 8m, 10m (cap) with the default bounds.

use std::time::Duration;

/// Fibonacci backoff sequence, capped at a maximum
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    max_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
}

impl FibonacciBackoff {
    /// New sequence starting at `min_minutes` and never exceeding `max_minutes`
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            max_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes.min(max_minutes),
        }
    }

    /// Current delay, then advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current_minutes.saturating_mul(60));

        let next = self.prev_minutes.saturating_add(self.current_minutes);
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next.min(self.max_minutes);

        delay
    }
}
