//! services/site/src/auth/token.rs
//!
//! Signed session tokens. A token carries the caller's full identity and is
//! the only session state: it is re-verified on every request and nothing is
//! stored server-side.

use chrono::{DateTime, Utc};
use dealership_core::domain::Identity;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::web::cookies;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub identity: Identity,
    /// Issued at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiration time (Unix timestamp, seconds).
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to sign session token: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// Signing material and lifetime for session tokens.
///
/// The same `ttl` drives the token's `exp` claim and the cookie's `Max-Age`,
/// both expressed in seconds.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration, secure_cookie: bool) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            secure_cookie,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            identity: identity.clone(),
            iat,
            exp: iat.saturating_add(ttl),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Decodes and validates the signature and expiry of `token`.
    pub fn claims(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    /// The identity in a valid token. Any invalid token means "no identity".
    pub fn verify(&self, token: &str) -> Option<Identity> {
        match self.claims(token) {
            Ok(claims) => Some(claims.identity),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }

    pub fn session_cookie(&self, token: &str) -> String {
        cookies::build(SESSION_COOKIE, token, Some(self.ttl), self.secure_cookie)
    }

    pub fn clear_cookie(&self) -> String {
        cookies::expire(SESSION_COOKIE, self.secure_cookie)
    }
}
