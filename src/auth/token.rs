//! Signed, self-contained session tokens.
//!
//! The codec is the single trust boundary for request identity: every
//! authenticated operation resolves the caller through [`TokenCodec::verify`]
//! and must reject the request when it returns `None`.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Identity claims embedded in every session token.
///
/// Claims are immutable once issued; they are trusted only after the
/// signature and expiry have been verified.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SessionClaims {
    /// User id (UUID in string form).
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Email captured at issuance. May go stale after a settings change;
    /// refreshed at the next login.
    pub email: String,

    /// Expiry (Unix timestamp, seconds). The only termination mechanism
    /// besides the client discarding the cookie.
    pub exp: i64,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
}

/// Issues and verifies HS256-signed session tokens.
///
/// Constructed once at startup with the configured secret and injected into
/// handler state, so tests can use a fixed secret deterministically.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is the contract; no leeway so a token is invalid the
        // second its TTL elapses.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token for the given identity, expiring TTL seconds from now.
    ///
    /// # Errors
    /// Returns an error if serialization or signing fails.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = now_unix_seconds();
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            exp: now.saturating_add(self.ttl_seconds),
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("failed to sign session token")
    }

    /// Verify a token and return its claims.
    ///
    /// Fails closed: a malformed token, invalid signature, or elapsed
    /// expiry all yield `None`.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

/// Unix seconds for token issuance and TTL checks.
fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
