//! Fixed-window limiter for outbound messages.

use std::time::{Duration, Instant};

/// Allows at most `max_messages` per `interval`. Time is passed in, so the
/// limiter never reads the clock itself.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_messages: usize,
    interval: Duration,
    window_start: Option<Instant>,
    sent: usize,
}

impl RateLimiter {
    pub fn new(max_messages: usize, interval: Duration) -> Self {
        Self {
            max_messages,
            interval,
            window_start: None,
            sent: 0,
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Claim up to `wanted` sends at `now`. Returns how many were granted.
    pub fn take(&mut self, now: Instant, wanted: usize) -> usize {
        let expired = match self.window_start {
            Some(start) => now.saturating_duration_since(start) >= self.interval,
            None => true,
        };
        if expired {
            self.window_start = Some(now);
            self.sent = 0;
        }
        let granted = wanted.min(self.max_messages.saturating_sub(self.sent));
        self.sent += granted;
        granted
    }
}
