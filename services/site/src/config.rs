//! services/site/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::Level;

/// Token lifetime used when `SESSION_TTL_SECONDS` is not set.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: Level,
    /// Secret used to sign session tokens. Never logged.
    pub access_token_secret: String,
    /// Lifetime of a session token and of the cookie carrying it.
    pub session_ttl: Duration,
    pub secure_cookies: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let host_str = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let host = host_str
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidValue("HOST".to_string(), e.to_string()))?;
        let port = parse_or("PORT", &lookup, 5500u16)?;
        let bind_address = SocketAddr::new(host, port);

        // --- Database Settings ---
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", &lookup, 5u32)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Session Settings ---
        let access_token_secret = lookup("ACCESS_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("ACCESS_TOKEN_SECRET".to_string()))?;

        let ttl_seconds = parse_or("SESSION_TTL_SECONDS", &lookup, DEFAULT_SESSION_TTL.as_secs())?;
        if ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECONDS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let session_ttl = Duration::from_secs(ttl_seconds);

        let secure_cookies = parse_or("COOKIE_SECURE", &lookup, false)?;

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            access_token_secret,
            session_ttl,
            secure_cookies,
        })
    }
}

fn parse_or<T, F>(name: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
