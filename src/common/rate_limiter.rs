//! Sliding-window rate limiting
//!
//! Keeps the timestamps of the most recent admissions. When a new request
//! would be the `max_requests`-th inside one window, it is scheduled for the
//! moment the oldest tracked admission leaves the window. Poloniex allows
//! 6 calls per second; the default of 5 leaves a margin.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Configuration for the rate limiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// Admissions allowed per window
    pub max_requests: usize,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_ms: 1_000,
        }
    }
}

impl RateLimiterConfig {
    /// Set admissions allowed per window
    pub fn with_rate(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Set window length
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window_ms = window.as_millis() as u64;
        self
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Record of recent admission instants
///
/// Pure bookkeeping: [`RateWindow::reserve`] never sleeps, it returns how long
/// the caller must wait. The caller sleeps without holding any lock.
#[derive(Debug)]
pub struct RateWindow {
    stamps: VecDeque<Instant>,
    history: usize,
    window: Duration,
    admitted: u64,
}

impl RateWindow {
    pub fn new(config: &RateLimiterConfig) -> Self {
        let history = config.max_requests.saturating_sub(1).max(1);
        Self {
            stamps: VecDeque::with_capacity(history + 1),
            history,
            window: config.window(),
            admitted: 0,
        }
    }

    /// Reserve the next slot at or after `now`, returning the wait before it
    ///
    /// The recorded instant is the scheduled one (`now + wait`), so callers
    /// reserving concurrently are spaced against each other.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let mut wait = Duration::ZERO;

        if self.stamps.len() >= self.history {
            if let Some(&oldest) = self.stamps.front() {
                wait = (oldest + self.window).saturating_duration_since(now);
            }
        }

        self.stamps.push_back(now + wait);
        while self.stamps.len() > self.history {
            self.stamps.pop_front();
        }
        self.admitted += 1;

        wait
    }

    /// Total admissions granted
    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    /// Number of tracked timestamps
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}
