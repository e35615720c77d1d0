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

/// Deployment mode. Production hides internal error details and marks the
/// session cookie `Secure`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Production,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub mode: RuntimeMode,
    pub cat_api_base_url: String,
    pub cat_api_key: String,
    pub cors_origins: Vec<String>,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let mut bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;
        if let Some(port) = var("PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;
            bind_address.set_port(port);
        }

        let database_url =
            var("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), e.to_string())
            })?,
            None => 5,
        };

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let mode = parse_mode(var("APP_ENV").or_else(|| var("NODE_ENV")))?;

        // --- Cat API ---
        let cat_api_base_url = var("CAT_API_BASE_URL")
            .unwrap_or_else(|| "https://api.thecatapi.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        let cat_api_key = var("CAT_API_KEY").unwrap_or_default();

        // Credentialed CORS cannot be combined with a wildcard origin.
        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| {
                "http://localhost:3000,http://localhost,http://localhost:80".to_string()
            })
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::InvalidValue(
                "CORS_ORIGINS".to_string(),
                "'*' is not allowed because the session cookie is sent with credentials"
                    .to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            mode,
            cat_api_base_url,
            cat_api_key,
            cors_origins,
        })
    }
}

fn parse_mode(raw: Option<String>) -> Result<RuntimeMode, ConfigError> {
    match raw.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("") | Some("development") | Some("dev") | Some("test") => {
            Ok(RuntimeMode::Development)
        }
        Some("production") | Some("prod") => Ok(RuntimeMode::Production),
        Some(other) => Err(ConfigError::InvalidValue(
            "APP_ENV".to_string(),
            format!("'{}' is not a known runtime mode", other),
        )),
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
    fn defaults_apply_with_only_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/cats")]).unwrap();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.cat_api_base_url, "https://api.thecatapi.com/v1");
        assert_eq!(config.cors_origins.len(), 3);
        assert_eq!(config.database_max_connections, 5);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn port_overrides_bind_address_port() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/cats"),
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("PORT", "4000"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:4000");
    }

    #[test]
    fn node_env_is_a_fallback_for_the_mode() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/cats"),
            ("NODE_ENV", "production"),
        ])
        .unwrap();
        assert!(config.mode.is_production());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/cats"),
            ("APP_ENV", "staging"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidValue(..))));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_cat_api_url() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/cats"),
            ("CAT_API_BASE_URL", "https://cats.example/v1/"),
        ])
        .unwrap();
        assert_eq!(config.cat_api_base_url, "https://cats.example/v1");
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/cats"),
            ("CORS_ORIGINS", "http://localhost:3000, *"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidValue(v, _)) if v == "CORS_ORIGINS"));
    }
}
