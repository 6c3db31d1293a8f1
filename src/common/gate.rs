//! Request admission gate
//!
//! The rate window and the last issued nonce are the only mutable state
//! shared by concurrent callers of one client. Both live behind a single
//! mutex so that slot reservation and nonce issuance happen in one critical
//! section: nonce order always matches admission order. The lock covers only
//! the bookkeeping; the wait for a reserved slot happens after it is released.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use super::nonce::NonceGenerator;
use super::rate_limiter::{RateLimiterConfig, RateWindow};

#[derive(Debug)]
struct GateState {
    window: RateWindow,
    nonces: NonceGenerator,
}

/// Counters exposed for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateStats {
    pub admissions: u64,
    pub nonces_issued: u64,
    pub last_nonce: Option<u64>,
}

/// Shared admission gate; clones share state
#[derive(Debug, Clone)]
pub struct RequestGate {
    state: Arc<Mutex<GateState>>,
}

impl RequestGate {
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self::with_nonces(config, NonceGenerator::new())
    }

    /// Gate with a caller-supplied nonce source
    pub fn with_nonces(config: &RateLimiterConfig, nonces: NonceGenerator) -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState {
                window: RateWindow::new(config),
                nonces,
            })),
        }
    }

    /// Wait for a rate slot (public requests)
    pub async fn admit(&self) {
        let release = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            now + state.window.reserve(now)
        };
        self.wait_for(release).await;
    }

    /// Wait for a rate slot and take the nonce issued with it (signed requests)
    pub async fn admit_signed(&self) -> u64 {
        let (release, nonce) = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let release = now + state.window.reserve(now);
            (release, state.nonces.next())
        };
        self.wait_for(release).await;
        nonce
    }

    pub async fn stats(&self) -> GateStats {
        let state = self.state.lock().await;
        GateStats {
            admissions: state.window.admitted(),
            nonces_issued: state.nonces.issued(),
            last_nonce: state.nonces.last(),
        }
    }

    async fn wait_for(&self, release: Instant) {
        if release > Instant::now() {
            tracing::debug!(
                "Rate limit reached, waiting {}ms",
                release.saturating_duration_since(Instant::now()).as_millis()
            );
            sleep_until(release).await;
        }
    }
}
