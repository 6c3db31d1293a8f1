//! HTTP transport
//!
//! One network call per invocation, no retry and no pacing; those belong to
//! the client. Responses are classified the same way regardless of which
//! [`Transport`] produced them, via [`decode_response`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;

use crate::auth::SignedEnvelope;
use crate::error::{PoloniexError, PoloniexResult};

/// Base URL for the Poloniex API
pub const API_BASE_URL: &str = "https://poloniex.com";

/// Path of the public (unauthenticated) endpoint
pub const PUBLIC_PATH: &str = "/public";

/// Path of the trading (signed) endpoint
pub const TRADING_PATH: &str = "/tradingApi";

/// Performs a single exchange call and decodes the JSON body
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {base}/public?{query}`; `query` already holds `command=...`
    async fn send_public(&self, query: &str) -> PoloniexResult<Value>;

    /// `POST {base}/tradingApi` with the envelope body and `Key`/`Sign` headers
    async fn send_private(&self, envelope: &SignedEnvelope) -> PoloniexResult<Value>;
}

/// Classify an HTTP response
///
/// - 5xx: [`PoloniexError::Server`] (retriable)
/// - any other non-2xx: [`PoloniexError::Client`]
/// - body not JSON: [`PoloniexError::Decode`]
/// - JSON object with an `error` field: [`PoloniexError::Exchange`]
pub fn decode_response(status: u16, body: &str) -> PoloniexResult<Value> {
    if (500..600).contains(&status) {
        return Err(PoloniexError::Server {
            status,
            body: body.to_string(),
        });
    }
    if !(200..300).contains(&status) {
        return Err(PoloniexError::Client {
            status,
            body: body.to_string(),
        });
    }

    let value: Value = serde_json::from_str(body)?;
    if let Some(message) = value.get("error") {
        let message = match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(PoloniexError::Exchange(message));
    }

    Ok(value)
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PoloniexResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| PoloniexError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn public_url(&self, query: &str) -> String {
        format!("{}{}?{}", self.base_url, PUBLIC_PATH, query)
    }

    fn trading_url(&self) -> String {
        format!("{}{}", self.base_url, TRADING_PATH)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_public(&self, query: &str) -> PoloniexResult<Value> {
        let url = self.public_url(query);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        decode_response(status, &text)
    }

    async fn send_private(&self, envelope: &SignedEnvelope) -> PoloniexResult<Value> {
        let url = self.trading_url();
        tracing::debug!("POST {} command={} nonce={}", url, envelope.command, envelope.nonce);

        let mut request = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        for (name, value) in envelope.headers() {
            request = request.header(name, value);
        }

        let response = request.body(envelope.body.clone()).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        decode_response(status, &text)
    }
}
