//! Request pacing shared by every call a client makes
//!
//! - Nonce generation that never goes backwards
//! - Sliding-window rate limiting
//! - The gate that guards both under one lock

pub mod gate;
pub mod nonce;
pub mod rate_limiter;

pub use gate::{GateStats, RequestGate};
pub use nonce::NonceGenerator;
pub use rate_limiter::{RateLimiterConfig, RateWindow};
