//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

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

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub cors_origin: String,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = or_default("BIND_ADDRESS", "0.0.0.0:5000")
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = required("DATABASE_URL")?;

        let db_max_connections = or_default("DB_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string(), e.to_string())
            })?;

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Authentication ---
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let jwt_expiry_hours = or_default("JWT_EXPIRY_HOURS", "24")
            .parse::<i64>()
            .ok()
            .filter(|hours| *hours > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "JWT_EXPIRY_HOURS".to_string(),
                    "must be a positive number of hours".to_string(),
                )
            })?;

        let cors_origin = or_default("CORS_ORIGIN", "http://localhost:3000");

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            jwt_secret,
            jwt_expiry_hours,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/timekeeper"),
            ("JWT_SECRET", "secret"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 5000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.jwt_expiry_hours, 24);
        assert_eq!(config.cors_origin, "http://localhost:3000");
    }

    #[test]
    fn required_keys_are_reported() {
        let err = load(&[("JWT_SECRET", "secret")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "DATABASE_URL"));
        let err = load(&[("DATABASE_URL", "postgres://x")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "JWT_SECRET"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "secret")];
        for bad in [
            ("BIND_ADDRESS", "nowhere"),
            ("RUST_LOG", "chatty"),
            ("JWT_EXPIRY_HOURS", "0"),
            ("DB_MAX_CONNECTIONS", "many"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push(bad);
            assert!(matches!(load(&pairs), Err(ConfigError::InvalidValue(..))));
        }
    }
}
