//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use clap::Parser;
use tracing::{error, info, warn};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "marketplace",
    about = "Marketplace backend: users, categories and products behind session tokens"
)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "MARKETPLACE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "MARKETPLACE_PORT", default_value = "3333")]
    pub port: u16,

    /// Path to SQLite database file, or ":memory:"
    #[arg(short, long, env = "MARKETPLACE_DATABASE", default_value = "marketplace.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Set the Secure flag on session cookies (serve over HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Signing key from `JWT_SECRET` (removed from the environment once read) or
/// from `--jwt-secret-file`. Logs the reason and returns None when unusable.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<Vec<u8>> {
    let secret = match (std::env::var("JWT_SECRET"), jwt_secret_file) {
        (Ok(secret), _) => {
            // SAFETY: called during startup before the runtime spawns tasks
            // that could read the environment concurrently.
            unsafe { std::env::remove_var("JWT_SECRET") };
            secret
        }
        (Err(_), Some(path)) => read_secret_file(path)?,
        (Err(_), None) => {
            error!("No signing key: set JWT_SECRET or pass --jwt-secret-file");
            return None;
        }
    };

    check_jwt_secret(secret).map(String::into_bytes)
}

fn read_secret_file(path: &str) -> Option<String> {
    std::fs::read_to_string(path)
        .map(|content| content.trim().to_string())
        .inspect_err(|e| error!(path = %path, error = %e, "Failed to read JWT secret file"))
        .ok()
}

fn check_jwt_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            min = MIN_JWT_SECRET_LENGTH,
            "JWT secret is too short to sign session tokens"
        );
        return None;
    }
    Some(secret)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(db: Database, jwt_secret: Vec<u8>, secure_cookies: bool) -> ServerConfig {
    if !secure_cookies {
        warn!("Session cookies are sent without the Secure flag");
    }

    ServerConfig {
        db,
        jwt_secret,
        secure_cookies,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
