//! Poloniex error types
//!
//! Every layer returns a [`PoloniexResult`]; nothing is collapsed into an empty
//! response. Callers can tell "the exchange said no" ([`PoloniexError::Exchange`],
//! [`PoloniexError::Client`]) apart from "we couldn't reach the exchange"
//! ([`PoloniexError::Network`], [`PoloniexError::Server`],
//! [`PoloniexError::ExhaustedRetries`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoloniexError {
    /// Connection-level failure (DNS, refused, reset, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 5xx
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// HTTP 4xx and any other non-success status that isn't 5xx
    #[error("Client error ({status}): {body}")]
    Client { status: u16, body: String },

    /// Parameters could not be form-encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Response body is not valid JSON
    #[error("Decode error: {0}")]
    Decode(String),

    /// HTTP 200 carrying an `{"error": ...}` object
    #[error("Exchange rejected request: {0}")]
    Exchange(String),

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: Box<PoloniexError>,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl PoloniexError {
    /// Whether another attempt may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            Self::ExhaustedRetries { last, .. } => last.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PoloniexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PoloniexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type PoloniexResult<T> = Result<T, PoloniexError>;
