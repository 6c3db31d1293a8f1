//! Client configuration
//!
//! Loaded from a JSON file or built in code, with environment overrides for
//! deployment-specific values. Credentials are never part of the file; they
//! come from [`Credentials::from_env`](crate::auth::Credentials::from_env).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::RateLimiterConfig;
use crate::error::{PoloniexError, PoloniexResult};
use crate::retry::RetryConfig;
use crate::transport::API_BASE_URL;

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub retry: RetryConfig,
    pub rate_limit: RateLimiterConfig,
    /// Run the balances bootstrap check when the client is built
    pub verify_on_connect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            timeout_secs: 30,
            retry: RetryConfig::default(),
            rate_limit: RateLimiterConfig::default(),
            verify_on_connect: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> PoloniexResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PoloniexError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| PoloniexError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> PoloniexResult<Self> {
        dotenv::dotenv().ok();
        Self::default().with_env_overrides()
    }

    /// Apply `POLONIEX_BASE_URL`, `POLONIEX_TIMEOUT_SECS` and `POLONIEX_MAX_RETRIES`
    pub fn with_env_overrides(self) -> PoloniexResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> PoloniexResult<Self> {
        if let Some(url) = lookup("POLONIEX_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = lookup("POLONIEX_TIMEOUT_SECS") {
            self.timeout_secs = secs.parse().map_err(|_| {
                PoloniexError::Config(format!("POLONIEX_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(retries) = lookup("POLONIEX_MAX_RETRIES") {
            self.retry.max_retries = retries.parse().map_err(|_| {
                PoloniexError::Config(format!("POLONIEX_MAX_RETRIES is not a number: {}", retries))
            })?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.retry.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry = self.retry.with_backoff(backoff);
        self
    }

    /// Set rate limit (requests per window)
    pub fn with_rate_limit(mut self, max_requests: usize) -> Self {
        self.rate_limit = self.rate_limit.with_rate(max_requests);
        self
    }

    pub fn with_verify_on_connect(mut self, verify: bool) -> Self {
        self.verify_on_connect = verify;
        self
    }
}
