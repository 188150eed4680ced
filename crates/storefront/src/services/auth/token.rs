//! Signed bearer tokens.
//!
//! A token is `{payload}.{signature}` where `payload` is the base64url JSON
//! claims and `signature` is the base64url HMAC-SHA256 of the payload. Clients
//! treat the string as opaque.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use qkart_core::Username;

type HmacSha256 = Hmac<Sha256>;

/// Errors from issuing or verifying a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not of the form `payload.signature`, or not decodable.
    #[error("malformed token")]
    Malformed,
    /// Signature does not match the payload.
    #[error("invalid token signature")]
    BadSignature,
    /// The validity window has passed.
    #[error("token expired")]
    Expired,
    /// The signing key was rejected by HMAC.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to.
    pub sub: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Validity window of issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `username`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the secret cannot key HMAC.
    pub fn issue(&self, username: &Username) -> Result<String, TokenError> {
        self.issue_at(username, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the secret cannot key HMAC.
    pub fn issue_at(&self, username: &Username, now: DateTime<Utc>) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let iat = now.timestamp();
        let claims = Claims {
            sub: username.as_str().to_owned(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        let json = serde_json::to_vec(&claims).map_err(|_| TokenError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes())?);
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token and return the username it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is malformed, tampered with, or
    /// expired.
    pub fn verify(&self, token: &str) -> Result<Username, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is malformed, tampered with, or
    /// expired at `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Username, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Username::parse(&claims.sub).map_err(|_| TokenError::Malformed)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::InvalidKey)
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
