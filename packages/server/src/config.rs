//! Server configuration
//!
//! Read from environment variables at startup:
//!
//! - `ANSWERDESK_PORT`: listen port (default: 5000)
//! - `ANSWERDESK_DB_PATH`: database file (default: ~/.answerdesk/database/answerdesk.db)
//! - `ANSWERDESK_BUSY_TIMEOUT_MS`: how long a writer waits for the lock (default: 5000)
//! - `ANSWERDESK_SENTINEL`: swap sentinel, `scratch` or a non-positive id (default: -9999)
//! - `CORS_ALLOW_ORIGIN`: allowed browser origin (default: http://localhost:3000)

use answerdesk_core::db::DEFAULT_BUSY_TIMEOUT_MS;
use answerdesk_core::services::{SentinelStrategy, SwapConfig};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error("Failed to get home directory")]
    NoHomeDirectory,
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidVar {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub cors_allow_origin: String,
    pub swap: SwapConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("ANSWERDESK_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid("ANSWERDESK_PORT", e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let db_path = match lookup("ANSWERDESK_DB_PATH") {
            Some(raw) => PathBuf::from(raw),
            None => default_db_path()?,
        };

        let busy_timeout_ms = match lookup("ANSWERDESK_BUSY_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid("ANSWERDESK_BUSY_TIMEOUT_MS", e.to_string()))?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        let swap = match lookup("ANSWERDESK_SENTINEL") {
            Some(raw) => SwapConfig::with_sentinel(
                raw.parse::<SentinelStrategy>()
                    .map_err(|e| ConfigError::invalid("ANSWERDESK_SENTINEL", e))?,
            ),
            None => SwapConfig::default(),
        };

        let cors_allow_origin =
            lookup("CORS_ALLOW_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let config = Self {
            port,
            db_path,
            busy_timeout_ms,
            cors_allow_origin,
            swap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "ANSWERDESK_BUSY_TIMEOUT_MS",
                "must be greater than 0",
            ));
        }

        if self.cors_allow_origin.parse::<axum::http::HeaderValue>().is_err() {
            return Err(ConfigError::invalid(
                "CORS_ALLOW_ORIGIN",
                "must be a valid HTTP origin",
            ));
        }

        self.swap
            .validate()
            .map_err(|reason| ConfigError::invalid("ANSWERDESK_SENTINEL", reason))
    }
}

/// ~/.answerdesk/database/answerdesk.db
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;

    Ok(home_dir
        .join(".answerdesk")
        .join("database")
        .join("answerdesk.db"))
}
