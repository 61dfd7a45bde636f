//! Credential checks and token lifecycle.
//!
//! A token moves through `Valid -> RefreshWindow -> Expired` purely as a
//! function of wall-clock time. Only a token inside the refresh window can be
//! traded for a new one. There is no revocation list.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::db::Database;
use crate::error::{AppError, FieldViolation, ResultExt};
use crate::jwt::{IssuedToken, JwtConfig, SessionClaims, TOKEN_TTL, TokenError, unix_now};
use crate::password::{DECOY_HASH, verify_password};

/// Trailing interval before expiry during which reauthentication is accepted.
pub const REFRESH_WINDOW: Duration = Duration::from_secs(30);

/// Where a token sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// More than the refresh window remains
    Valid { remaining: u64 },
    /// Still valid, and close enough to expiry to be refreshed
    RefreshWindow { remaining: u64 },
    Expired,
}

impl TokenState {
    pub fn at(expires_at: u64, now: u64) -> Self {
        if expires_at <= now {
            return TokenState::Expired;
        }
        let remaining = expires_at - now;
        if remaining > REFRESH_WINDOW.as_secs() {
            TokenState::Valid { remaining }
        } else {
            TokenState::RefreshWindow { remaining }
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>) -> Self {
        Self { db, jwt }
    }

    /// Check a login name and password and issue a session token.
    /// An unknown name and a wrong password fail identically.
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<IssuedToken, AppError> {
        let user = self
            .db
            .users()
            .get_by_name(name)
            .await
            .internal("Failed to look up user")?;

        // Unknown names still pay for one verification
        let stored = user.as_ref().map_or(DECOY_HASH, |user| user.password.as_str());
        let matches = verify_password(password, stored)
            .await
            .internal("Failed to verify password")?;

        match user {
            Some(user) if matches => self.issue(&user.id),
            Some(user) => {
                debug!(user = %user.id, "Authentication failed: wrong password");
                Err(AppError::AuthenticationFailed)
            }
            None => {
                debug!("Authentication failed: unknown login name");
                Err(AppError::AuthenticationFailed)
            }
        }
    }

    /// Trade a token that is about to expire for a fresh one bound to the same
    /// subject. Never touches the store.
    pub fn reauthenticate(&self, token: Option<&str>) -> Result<IssuedToken, AppError> {
        let claims = self.parse(token)?;
        let now = unix_now().internal("Failed to read clock")?;

        match TokenState::at(claims.exp, now) {
            TokenState::Expired => {
                debug!(user = %claims.sub, "Reauthentication with expired token");
                Err(AppError::AuthenticationFailed)
            }
            TokenState::Valid { remaining } => Err(AppError::validation(FieldViolation::new(
                "re_auth_request.token",
                "within_refresh_window",
                format!("{}s", remaining),
            ))),
            TokenState::RefreshWindow { .. } => self.issue(&claims.sub),
        }
    }

    /// Accept a token only if its signature verifies and it has not expired.
    pub fn verify(&self, token: Option<&str>) -> Result<SessionClaims, AppError> {
        let claims = self.parse(token)?;
        let now = unix_now().internal("Failed to read clock")?;

        match TokenState::at(claims.exp, now) {
            TokenState::Expired => {
                debug!(user = %claims.sub, "Rejected expired token");
                Err(AppError::AuthenticationFailed)
            }
            _ => Ok(claims),
        }
    }

    fn parse(&self, token: Option<&str>) -> Result<SessionClaims, AppError> {
        let token = token.ok_or(AppError::MissingToken)?;
        self.jwt.parse(token).map_err(|e| match e {
            TokenError::MalformedToken(_) | TokenError::InvalidSignature => {
                debug!(error = %e, "Rejected token");
                AppError::AuthenticationFailed
            }
            other => AppError::internal("Failed to parse token", other),
        })
    }

    fn issue(&self, subject: &str) -> Result<IssuedToken, AppError> {
        self.jwt
            .issue(subject, TOKEN_TTL)
            .internal("Failed to issue token")
    }
}
