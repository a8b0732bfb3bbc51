//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use lehrjournal_core::credentials::DEFAULT_APPRENTICE_DOMAIN;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials of the admin created on first start.
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Without a database URL the service keeps everything in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub cors_origin: String,
    pub session_ttl_days: i64,
    pub apprentice_email_domain: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            cors_origin: "http://localhost:5173".to_string(),
            session_ttl_days: 30,
            apprentice_email_domain: DEFAULT_APPRENTICE_DOMAIN.to_string(),
            bootstrap_admin: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Config::default();

        // --- Server and Database Settings ---
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(value) => value.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.bind_address,
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        // --- Account Settings ---
        let session_ttl_days = match std::env::var("SESSION_TTL_DAYS") {
            Ok(value) => match value.parse::<i64>() {
                Ok(days) if days > 0 => days,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "SESSION_TTL_DAYS".to_string(),
                        format!("'{}' is not a positive number of days", value),
                    ))
                }
            },
            Err(_) => defaults.session_ttl_days,
        };

        let apprentice_email_domain = std::env::var("APPRENTICE_EMAIL_DOMAIN")
            .unwrap_or(defaults.apprentice_email_domain);

        let bootstrap_admin = match (
            std::env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (Some(_), None) => {
                return Err(ConfigError::MissingVar("BOOTSTRAP_ADMIN_PASSWORD".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingVar("BOOTSTRAP_ADMIN_EMAIL".to_string()))
            }
            (None, None) => None,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            session_ttl_days,
            apprentice_email_domain,
            bootstrap_admin,
        })
    }
}
