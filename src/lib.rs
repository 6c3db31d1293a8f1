//! Poloniex Trading API Client
//!
//! A client for the Poloniex HTTP API that takes care of the parts every
//! command shares:
//! - **Signing**: HMAC-SHA512 over the form-encoded body, `Key`/`Sign` headers
//! - **Nonces**: strictly increasing per client, even if the clock stalls or steps back
//! - **Rate limiting**: sliding one-second window shared by public and private calls
//! - **Retry**: 5xx and network failures are retried with a fixed backoff, each
//!   attempt freshly signed
//! - **Typed errors**: failures are never reported as an empty response
//!
//! ## Example
//! ```no_run
//! use poloniex_client::{
//!     ClientConfig, Credentials, CurrencyPair, Market, PoloniexApi, PoloniexClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::default().with_verify_on_connect(true);
//!     let client = PoloniexClient::connect(Credentials::from_env()?, &config).await?;
//!
//!     if client.is_connected().await {
//!         let pair: CurrencyPair = "BTC_ETH".parse()?;
//!         let orders = client.return_open_orders(&Market::Pair(pair)).await?;
//!         println!("Open orders: {}", orders);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod transport;
pub mod types;

pub use auth::{Credentials, SignedEnvelope};
pub use client::{ConnectionState, Exchange, PoloniexClient};
pub use commands::{Command, PoloniexApi};
pub use common::{GateStats, NonceGenerator, RateLimiterConfig};
pub use config::ClientConfig;
pub use error::{PoloniexError, PoloniexResult};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::{HttpTransport, Transport, API_BASE_URL};
pub use types::{
    Account, AccountSnapshot, ChartPeriod, CompleteBalance, CurrencyPair, Market, OrderOptions,
    TimeRange,
};
