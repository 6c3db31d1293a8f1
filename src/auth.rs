//! Authentication utilities for the Poloniex trading API
//!
//! Private requests are form-encoded and signed with HMAC-SHA512 over the
//! exact body bytes. The exchange recomputes the signature from the bytes it
//! receives, so parameter order is part of the contract: pairs are encoded in
//! the order they are given and never sorted.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::{PoloniexError, PoloniexResult};

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the API access key
pub const KEY_HEADER: &str = "Key";

/// Header carrying the hex HMAC-SHA512 signature
pub const SIGN_HEADER: &str = "Sign";

/// Form-encode parameters in insertion order
///
/// # Example
///
/// ```
/// use poloniex_client::auth::encode_params;
///
/// let body = encode_params(&[("command", "buy"), ("currencyPair", "BTC_ETH")]).unwrap();
/// assert_eq!(body, "command=buy&currencyPair=BTC_ETH");
/// ```
pub fn encode_params<K, V>(params: &[(K, V)]) -> PoloniexResult<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    serde_urlencoded::to_string(pairs)
        .map_err(|e| PoloniexError::Encode(format!("Failed to encode parameters: {}", e)))
}

/// Generate the hex HMAC-SHA512 signature of `body` keyed by `secret`
pub fn sign_request(body: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature against the expected value
///
/// Useful for testing and for mock transports that check what was sent.
pub fn verify_signature(body: &str, secret: &[u8], signature: &str) -> bool {
    let computed = sign_request(body, secret);
    constant_time_eq(computed.as_bytes(), signature.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn latin1_bytes(text: &str) -> PoloniexResult<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                PoloniexError::Config(format!("API secret contains non latin-1 character {:?}", c))
            })
        })
        .collect()
}

/// API credential pair
///
/// Immutable once built. Rotation replaces the whole value, so a signer that
/// holds a `Credentials` always sees a matching key and secret. The secret is
/// kept as raw bytes and never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret: Vec<u8>,
}

impl Credentials {
    /// Create credentials from an access key and a text secret
    ///
    /// The secret is projected to latin-1 bytes, one byte per character.
    /// Characters above U+00FF have no such byte and are rejected.
    pub fn new(access_key: impl Into<String>, secret: impl AsRef<str>) -> PoloniexResult<Self> {
        let secret = latin1_bytes(secret.as_ref())?;
        Ok(Self::from_bytes(access_key, secret))
    }

    /// Create credentials from an access key and a raw secret
    pub fn from_bytes(access_key: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            access_key: access_key.into(),
            secret,
        }
    }

    /// Create credentials from environment variables
    ///
    /// Loads `.env` if present, then reads `POLONIEX_API_KEY` and `POLONIEX_API_SECRET`.
    pub fn from_env() -> PoloniexResult<Self> {
        dotenv::dotenv().ok();

        let access_key = std::env::var("POLONIEX_API_KEY")
            .map_err(|_| PoloniexError::Config("POLONIEX_API_KEY is not set".to_string()))?;
        let secret = std::env::var("POLONIEX_API_SECRET")
            .map_err(|_| PoloniexError::Config("POLONIEX_API_SECRET is not set".to_string()))?;
        Self::new(access_key, secret)
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Sign an encoded body with this secret
    pub fn sign(&self, body: &str) -> String {
        sign_request(body, &self.secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Keys the envelope writes itself
const RESERVED_KEYS: [&str; 2] = ["command", "nonce"];

/// Fail if caller parameters try to set `command` or `nonce`
pub(crate) fn reject_reserved(params: &[(&str, &str)]) -> PoloniexResult<()> {
    match params.iter().find(|(k, _)| RESERVED_KEYS.contains(k)) {
        Some((key, _)) => Err(PoloniexError::Encode(format!(
            "Parameter {} is set by the client and cannot be passed",
            key
        ))),
        None => Ok(()),
    }
}

/// Encoded private request ready to send
///
/// Built fresh for every attempt since the nonce changes each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub command: String,
    pub nonce: u64,
    pub key: String,
    pub body: String,
    pub signature: String,
}

impl SignedEnvelope {
    /// Encode `command`, `nonce`, then `params` in order, and sign the result
    pub fn new(
        credentials: &Credentials,
        command: &str,
        nonce: u64,
        params: &[(&str, &str)],
    ) -> PoloniexResult<Self> {
        reject_reserved(params)?;

        let nonce_str = nonce.to_string();
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        pairs.push(("command", command));
        pairs.push(("nonce", &nonce_str));
        pairs.extend_from_slice(params);

        let body = encode_params(&pairs)?;
        let signature = credentials.sign(&body);

        Ok(Self {
            command: command.to_string(),
            nonce,
            key: credentials.access_key().to_string(),
            body,
            signature,
        })
    }

    /// `Key` and `Sign` headers for the POST
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [(KEY_HEADER, &self.key), (SIGN_HEADER, &self.signature)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_request() {
        let signature = sign_request("command=returnBalances&nonce=1", b"test_secret");

        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        // SHA512 produces 64 bytes = 128 hex characters
        assert_eq!(signature.len(), 128);
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_request("what do ya want for nothing?", b"Jefe");
        assert_eq!(
            signature,
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn test_sign_consistency() {
        let body = "command=returnBalances&nonce=1700000000000";

        let sig1 = sign_request(body, b"test_secret");
        let sig2 = sign_request(body, b"test_secret");

        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_changed_value_changes_signature() {
        let a = encode_params(&[("command", "buy"), ("rate", "0.05")]).unwrap();
        let b = encode_params(&[("command", "buy"), ("rate", "0.06")]).unwrap();

        assert_ne!(sign_request(&a, b"secret"), sign_request(&b, b"secret"));
    }

    #[test]
    fn test_reordered_keys_change_signature() {
        let a = encode_params(&[("rate", "0.05"), ("amount", "10")]).unwrap();
        let b = encode_params(&[("amount", "10"), ("rate", "0.05")]).unwrap();

        assert_eq!(a, "rate=0.05&amount=10");
        assert_eq!(b, "amount=10&rate=0.05");
        assert_ne!(sign_request(&a, b"secret"), sign_request(&b, b"secret"));
    }

    #[test]
    fn test_different_secrets_produce_different_signatures() {
        let body = "command=returnBalances&nonce=1";
        assert_ne!(sign_request(body, b"secret1"), sign_request(body, b"secret2"));
    }

    #[test]
    fn test_encode_escapes_values() {
        let body = encode_params(&[("address", "a b&c=d"), ("paymentId", "ü")]).unwrap();
        assert_eq!(body, "address=a+b%26c%3Dd&paymentId=%C3%BC");
    }

    #[test]
    fn test_encode_empty() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(encode_params(&empty).unwrap(), "");
    }

    #[test]
    fn test_verify_signature() {
        let body = "command=returnBalances&nonce=1";
        let signature = sign_request(body, b"test_secret");

        assert!(verify_signature(body, b"test_secret", &signature));
        assert!(!verify_signature(body, b"other_secret", &signature));
        assert!(!verify_signature(body, b"test_secret", "deadbeef"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("my_key", "super_secret_value").unwrap();
        let debug = format!("{:?}", creds);

        assert!(debug.contains("my_key"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super_secret_value"));
    }

    #[test]
    fn test_credentials_secret_bytes() {
        let creds = Credentials::new("my_key", "abc123").unwrap();
        assert_eq!(creds.access_key(), "my_key");
        assert_eq!(creds.secret(), b"abc123");
        assert_eq!(creds.sign("x"), sign_request("x", b"abc123"));
    }

    #[test]
    fn test_envelope_layout() {
        let creds = Credentials::new("my_key", "my_secret").unwrap();
        let envelope = SignedEnvelope::new(
            &creds,
            "buy",
            1_700_000_000_000,
            &[("currencyPair", "BTC_ETH"), ("rate", "0.05"), ("amount", "10")],
        )
        .unwrap();

        assert_eq!(
            envelope.body,
            "command=buy&nonce=1700000000000&currencyPair=BTC_ETH&rate=0.05&amount=10"
        );
        assert_eq!(envelope.key, "my_key");
        assert_eq!(envelope.nonce, 1_700_000_000_000);
        assert!(verify_signature(&envelope.body, b"my_secret", &envelope.signature));

        let headers = envelope.headers();
        assert_eq!(headers[0], ("Key", "my_key"));
        assert_eq!(headers[1], ("Sign", envelope.signature.as_str()));
    }

    #[test]
    fn test_envelope_nonce_changes_signature() {
        let creds = Credentials::new("k", "s").unwrap();
        let a = SignedEnvelope::new(&creds, "returnBalances", 1, &[]).unwrap();
        let b = SignedEnvelope::new(&creds, "returnBalances", 2, &[]).unwrap();

        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_secret_is_latin1_projected() {
        let creds = Credentials::new("my_key", "caf\u{e9}").unwrap();
        assert_eq!(creds.secret(), &[b'c', b'a', b'f', 0xE9]);
        assert_eq!(creds.sign("x"), sign_request("x", &[b'c', b'a', b'f', 0xE9]));
    }

    #[test]
    fn test_secret_outside_latin1_rejected() {
        let err = Credentials::new("my_key", "secret\u{20ac}").unwrap_err();
        assert!(matches!(err, PoloniexError::Config(_)));
    }

    #[test]
    fn test_envelope_rejects_reserved_keys() {
        let creds = Credentials::new("k", "s").unwrap();

        let err = SignedEnvelope::new(&creds, "buy", 1, &[("nonce", "2")]).unwrap_err();
        assert!(matches!(err, PoloniexError::Encode(_)));

        let err = SignedEnvelope::new(&creds, "buy", 1, &[("rate", "1"), ("command", "sell")])
            .unwrap_err();
        assert!(matches!(err, PoloniexError::Encode(_)));
    }
}
