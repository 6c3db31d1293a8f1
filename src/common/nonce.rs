//! Nonce generation for signed requests
//!
//! Poloniex rejects any signed request whose nonce is not greater than the
//! last one it saw for the key. Nonces are wall-clock milliseconds, but the
//! generator never hands out a value at or below the previous one: if the
//! clock has not moved past it (burst of calls, or the clock stepped back),
//! the previous value plus one is issued instead.

use std::fmt;

/// Source of millisecond timestamps
pub type Clock = Box<dyn FnMut() -> u64 + Send>;

/// Current Unix time in milliseconds
pub fn unix_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Strictly increasing nonce source
///
/// # Example
///
/// ```
/// use poloniex_client::common::NonceGenerator;
///
/// let mut nonces = NonceGenerator::new();
/// let a = nonces.next();
/// let b = nonces.next();
/// assert!(b > a);
/// ```
pub struct NonceGenerator {
    clock: Clock,
    last: Option<u64>,
    issued: u64,
}

impl NonceGenerator {
    /// Nonce generator backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(unix_millis)
    }

    /// Nonce generator backed by a custom clock
    pub fn with_clock(clock: impl FnMut() -> u64 + Send + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            last: None,
            issued: 0,
        }
    }

    /// Issue the next nonce
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        let now = (self.clock)();
        let nonce = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last = Some(nonce);
        self.issued += 1;
        nonce
    }

    /// Last nonce handed out, if any
    pub fn last(&self) -> Option<u64> {
        self.last
    }

    /// Number of nonces handed out
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NonceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceGenerator")
            .field("last", &self.last)
            .field("issued", &self.issued)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(values: Vec<u64>) -> impl FnMut() -> u64 + Send + 'static {
        let mut iter = values.into_iter();
        move || iter.next().unwrap_or(0)
    }

    #[test]
    fn test_follows_advancing_clock() {
        let mut nonces = NonceGenerator::with_clock(scripted(vec![100, 200, 300]));
        assert_eq!(nonces.next(), 100);
        assert_eq!(nonces.next(), 200);
        assert_eq!(nonces.next(), 300);
    }

    #[test]
    fn test_frozen_clock_still_increases() {
        let mut nonces = NonceGenerator::with_clock(|| 5_000);
        let seq: Vec<u64> = (0..5).map(|_| nonces.next()).collect();
        assert_eq!(seq, vec![5_000, 5_001, 5_002, 5_003, 5_004]);
    }

    #[test]
    fn test_clock_rollback() {
        let mut nonces = NonceGenerator::with_clock(scripted(vec![1_000, 900, 950, 1_001, 2_000]));
        let seq: Vec<u64> = (0..5).map(|_| nonces.next()).collect();
        assert_eq!(seq, vec![1_000, 1_001, 1_002, 1_003, 2_000]);
    }

    #[test]
    fn test_strictly_increasing_for_arbitrary_clock() {
        let raw = vec![7, 3, 3, 9, 1, 1, 1, 20, 15, 21, 0, 4];
        let mut nonces = NonceGenerator::with_clock(scripted(raw.clone()));
        let seq: Vec<u64> = (0..raw.len()).map(|_| nonces.next()).collect();

        for pair in seq.windows(2) {
            assert!(pair[1] > pair[0], "{:?} not increasing", pair);
        }
    }

    #[test]
    fn test_bookkeeping() {
        let mut nonces = NonceGenerator::with_clock(|| 42);
        assert_eq!(nonces.last(), None);
        assert_eq!(nonces.issued(), 0);

        nonces.next();
        nonces.next();
        assert_eq!(nonces.last(), Some(43));
        assert_eq!(nonces.issued(), 2);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(unix_millis() > 1_577_836_800_000);
        let mut nonces = NonceGenerator::new();
        let a = nonces.next();
        let b = nonces.next();
        assert!(b > a);
    }
}
