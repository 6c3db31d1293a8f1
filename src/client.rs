//! Poloniex API Client
//!
//! The facade every command goes through. A call is:
//! 1. admitted by the rate gate (signed calls also take a nonce there),
//! 2. signed with a snapshot of the current credentials (signed calls only),
//! 3. sent by the [`Transport`],
//! 4. retried by the [`RetryPolicy`] on 5xx or network failure, repeating
//!    steps 1-3 so each attempt has its own nonce and signature.
//!
//! # Example
//!
//! ```no_run
//! use poloniex_client::{PoloniexApi, PoloniexClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PoloniexClient::new("api_key", "api_secret")?;
//!
//!     let ticker = client.return_ticker().await?;
//!     println!("BTC_ETH last: {}", ticker["BTC_ETH"]["last"]);
//!
//!     let balances = client.return_balances().await?;
//!     println!("BTC: {}", balances["BTC"]);
//!
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::auth::{encode_params, reject_reserved, Credentials, SignedEnvelope};
use crate::commands::Command;
use crate::common::{GateStats, NonceGenerator, RequestGate};
use crate::config::ClientConfig;
use crate::error::PoloniexResult;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, Transport};

/// Outcome of the bootstrap balances check
///
/// Set at construction (when verification is requested) and on credential
/// rotation. It is not a live health flag: later failures don't change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No bootstrap check has run for the current credentials
    #[default]
    Unverified,
    /// The bootstrap balances call succeeded
    Connected,
    /// The bootstrap balances call failed
    Failed,
}

/// Capability interface for sending exchange commands
///
/// The wrapper methods in [`PoloniexApi`](crate::commands::PoloniexApi) are
/// written against this trait only.
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn execute_command(
        &self,
        command: &str,
        params: &[(&str, &str)],
        requires_auth: bool,
    ) -> PoloniexResult<Value>;
}

/// Poloniex Exchange API Client
///
/// Clones share the rate window, nonce sequence, credentials and connection
/// state, so one logical client can be handed to many tasks.
pub struct PoloniexClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
    credentials: Arc<RwLock<Arc<Credentials>>>,
    connection: Arc<RwLock<ConnectionState>>,
    gate: RequestGate,
    retry: RetryPolicy,
}

impl PoloniexClient<HttpTransport> {
    /// Create a new client with API credentials and default configuration
    pub fn new(access_key: impl Into<String>, secret: impl AsRef<str>) -> PoloniexResult<Self> {
        Self::with_config(Credentials::new(access_key, secret)?, &ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(credentials: Credentials, config: &ClientConfig) -> PoloniexResult<Self> {
        let transport = HttpTransport::new(config.base_url.clone(), config.timeout())?;
        Ok(Self::with_transport(credentials, config, transport))
    }

    /// Create a client from environment variables
    ///
    /// Expects `POLONIEX_API_KEY` and `POLONIEX_API_SECRET`; see
    /// [`ClientConfig::from_env`] for the optional overrides.
    pub fn from_env() -> PoloniexResult<Self> {
        let credentials = Credentials::from_env()?;
        let config = ClientConfig::from_env()?;
        Self::with_config(credentials, &config)
    }

    /// Create a client and run the bootstrap check if `config.verify_on_connect` is set
    pub async fn connect(credentials: Credentials, config: &ClientConfig) -> PoloniexResult<Self> {
        let client = Self::with_config(credentials, config)?;
        if config.verify_on_connect {
            client.initialize().await;
        }
        Ok(client)
    }
}

impl<T: Transport> PoloniexClient<T> {
    /// Create a client over any transport
    pub fn with_transport(credentials: Credentials, config: &ClientConfig, transport: T) -> Self {
        Self::with_parts(
            credentials,
            config,
            transport,
            RequestGate::new(&config.rate_limit),
        )
    }

    /// Create a client with a custom nonce source
    pub fn with_nonces(
        credentials: Credentials,
        config: &ClientConfig,
        transport: T,
        nonces: NonceGenerator,
    ) -> Self {
        let gate = RequestGate::with_nonces(&config.rate_limit, nonces);
        Self::with_parts(credentials, config, transport, gate)
    }

    fn with_parts(
        credentials: Credentials,
        config: &ClientConfig,
        transport: T,
        gate: RequestGate,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            credentials: Arc::new(RwLock::new(Arc::new(credentials))),
            connection: Arc::new(RwLock::new(ConnectionState::Unverified)),
            gate,
            retry: RetryPolicy::new(config.retry.clone()),
        }
    }

    /// Send a command through the rate gate, signer, transport and retry policy
    ///
    /// Returns the decoded JSON body on success. Exchange rejections and
    /// transport failures come back as distinct [`PoloniexError`](crate::PoloniexError)
    /// variants; there is no empty-result fallback. `command` and `nonce`
    /// are written by the client and rejected in `params`.
    pub async fn execute(
        &self,
        command: &str,
        params: &[(&str, &str)],
        requires_auth: bool,
    ) -> PoloniexResult<Value> {
        reject_reserved(params)?;
        self.retry
            .execute(command, || self.attempt(command, params, requires_auth, None))
            .await
    }

    /// One pass through gate, signer and transport
    ///
    /// Signed attempts use `pinned` when given, otherwise the current pair.
    async fn attempt(
        &self,
        command: &str,
        params: &[(&str, &str)],
        requires_auth: bool,
        pinned: Option<&Arc<Credentials>>,
    ) -> PoloniexResult<Value> {
        if requires_auth {
            let nonce = self.gate.admit_signed().await;
            // One snapshot per attempt: key and secret always come from the same pair.
            let credentials = match pinned {
                Some(credentials) => Arc::clone(credentials),
                None => self.credentials.read().await.clone(),
            };
            let envelope = SignedEnvelope::new(&credentials, command, nonce, params)?;
            self.transport.send_private(&envelope).await
        } else {
            self.gate.admit().await;
            let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
            pairs.push(("command", command));
            pairs.extend_from_slice(params);
            let query = encode_params(&pairs)?;
            self.transport.send_public(&query).await
        }
    }

    /// Run the bootstrap balances call and record the outcome
    ///
    /// Every attempt is signed with the pair that was current when the check
    /// started. If the pair is rotated before the check finishes, the outcome
    /// is discarded and `false` is returned.
    pub async fn initialize(&self) -> bool {
        let credentials = self.credentials.read().await.clone();
        let command = Command::ReturnBalances.as_str();

        let result = self
            .retry
            .execute(command, || self.attempt(command, &[], true, Some(&credentials)))
            .await;
        let state = match result {
            Ok(_) => ConnectionState::Connected,
            Err(e) => {
                tracing::warn!("Connection check failed: {}", e);
                ConnectionState::Failed
            }
        };

        // Rotation swaps the pair under the write lock, so holding a read
        // guard here keeps the comparison and the state write together.
        let current = self.credentials.read().await;
        if !Arc::ptr_eq(&*current, &credentials) {
            tracing::info!(
                "Discarding connection check for rotated key {}",
                credentials.access_key()
            );
            return false;
        }
        *self.connection.write().await = state;
        drop(current);

        tracing::info!("Connection state: {:?}", state);
        state == ConnectionState::Connected
    }

    /// Replace the credential pair, optionally re-running the bootstrap check
    ///
    /// The swap is a single pointer replacement: in-flight attempts keep the
    /// pair they already snapshotted, later attempts see the new pair.
    /// Returns whether the client is connected afterwards, or a `Config`
    /// error if the secret can't be projected to bytes.
    pub async fn rotate_credentials(
        &self,
        access_key: impl Into<String>,
        secret: impl AsRef<str>,
        verify: bool,
    ) -> PoloniexResult<bool> {
        let credentials = Credentials::new(access_key, secret)?;
        tracing::info!("Rotating credentials to key {}", credentials.access_key());

        *self.credentials.write().await = Arc::new(credentials);
        *self.connection.write().await = ConnectionState::Unverified;

        if verify {
            Ok(self.initialize().await)
        } else {
            Ok(false)
        }
    }

    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection.read().await
    }

    pub async fn is_connected(&self) -> bool {
        self.connection_state().await == ConnectionState::Connected
    }

    pub async fn access_key(&self) -> String {
        self.credentials.read().await.access_key().to_string()
    }

    /// Admission and nonce counters
    pub async fn gate_stats(&self) -> GateStats {
        self.gate.stats().await
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Clone for PoloniexClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            credentials: Arc::clone(&self.credentials),
            connection: Arc::clone(&self.connection),
            gate: self.gate.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for PoloniexClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self
            .credentials
            .try_read()
            .map(|c| c.access_key().to_string())
            .unwrap_or_else(|_| "<locked>".to_string());
        let connection = self
            .connection
            .try_read()
            .map(|c| format!("{:?}", *c))
            .unwrap_or_else(|_| "<locked>".to_string());

        f.debug_struct("PoloniexClient")
            .field("key", &key)
            .field("secret", &"[REDACTED]")
            .field("connection", &connection)
            .finish()
    }
}

#[async_trait]
impl<T: Transport> Exchange for PoloniexClient<T> {
    async fn execute_command(
        &self,
        command: &str,
        params: &[(&str, &str)],
        requires_auth: bool,
    ) -> PoloniexResult<Value> {
        self.execute(command, params, requires_auth).await
    }
}
