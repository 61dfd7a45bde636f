//! Session token signing and parsing.
//!
//! Tokens are stateless HS256 JWTs carrying the subject id and an absolute
//! expiry. Parsing checks the signature only; deciding whether the expiry is
//! acceptable belongs to the caller.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Session token lifetime: 5 minutes
pub const TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

/// JWT claims for session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Signing key shared by every request handler.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtConfig {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a token for `subject` expiring `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let duration = ttl.as_secs();
        let exp = now + duration;

        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            expires_at: exp,
            duration,
        })
    }

    /// Verify the signature and decode the claims. Expired tokens still parse.
    pub fn parse(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;

        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::MalformedToken(e),
            })
    }
}

/// Current wall-clock time in Unix seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::TimeError)
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    MalformedToken(jsonwebtoken::errors::Error),
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("system time error")]
    TimeError,
}
