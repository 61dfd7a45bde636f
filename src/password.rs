//! One-way password hashing with argon2id.
//!
//! Hashing is CPU bound, so both directions run on the blocking pool.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core},
};
use thiserror::Error;

/// Well-formed argon2id hash with the default parameters that matches no
/// password. Checked in place of a stored hash when a login name is unknown.
pub const DECOY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZH5U+kljfw8pApsDO8bBhQ$7RnhLZuRlz7KznyRRgNYEWG/hNLUn5wWxTPSH7V+DIM";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password hash is not valid: {0}")]
    InvalidHash(String),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Compute a PHC-formatted hash for a new password.
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand_core::OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    })
    .await?
}

/// Check a candidate password against a stored hash.
/// `Ok(false)` means the password is wrong; `Err` means the hash itself is unusable.
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await?
}
