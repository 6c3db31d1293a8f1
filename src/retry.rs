//! Bounded retry for exchange calls
//!
//! Each iteration calls the attempt closure again from scratch. For signed
//! commands that closure re-enters the rate gate and builds a new envelope,
//! so every retry carries a fresh nonce and signature rather than resending
//! stale bytes the exchange would reject.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::error::{PoloniexError, PoloniexResult};

/// Retry budget and backoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first (total attempts = 1 + max_retries)
    pub max_retries: u32,
    /// Fixed delay between attempts in milliseconds
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_ms: 3_000,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff_ms = backoff.as_millis() as u64;
        self
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Retry policy
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `attempt` until it succeeds, fails non-retriably, or the budget runs out
    ///
    /// Non-retriable errors are returned as-is. A retriable error on the last
    /// permitted attempt becomes [`PoloniexError::ExhaustedRetries`].
    pub async fn execute<F, Fut, T>(&self, command: &str, mut attempt: F) -> PoloniexResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PoloniexResult<T>>,
    {
        let total = self.config.max_retries + 1;
        let mut made = 0u32;

        loop {
            made += 1;
            let error = match attempt().await {
                Ok(value) => {
                    if made > 1 {
                        tracing::debug!("{} succeeded after {} attempts", command, made);
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !error.is_retriable() {
                tracing::debug!("{} failed with non-retriable error: {}", command, error);
                return Err(error);
            }

            if made >= total {
                tracing::warn!("{} failed after {} attempts: {}", command, made, error);
                return Err(PoloniexError::ExhaustedRetries {
                    attempts: made,
                    last: Box::new(error),
                });
            }

            tracing::warn!(
                "{} failed (attempt {}/{}), retrying in {}ms: {}",
                command,
                made,
                total,
                self.config.backoff_ms,
                error
            );
            sleep(self.config.backoff()).await;
        }
    }
}
