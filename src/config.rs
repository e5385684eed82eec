//! Application configuration management.
//!
//! Configuration is read from environment variables with `envy`, after an
//! optional `.env` file has been loaded.

use std::time::Duration;

use serde::Deserialize;

use crate::services::notifier::validate_webhook_url;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `QUERY_MAX_ROWS` (optional): hard row cap for gateway queries,
///   defaults to 10000, at most 1000000
/// - `QUERY_TIMEOUT_SECS` (optional): per-statement timeout, defaults to 30
/// - `DEGRADED_START` (optional): start even if the database is unreachable
/// - `NOTIFY_WEBHOOK_URL` / `NOTIFY_WEBHOOK_SECRET` (optional): issuance notices
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_query_max_rows")]
    pub query_max_rows: usize,

    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    #[serde(default)]
    pub degraded_start: bool,

    #[serde(default)]
    pub notify_webhook_url: Option<String>,

    #[serde(default)]
    pub notify_webhook_secret: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_query_max_rows() -> usize {
    10_000
}

/// Largest accepted `QUERY_MAX_ROWS`.
pub const MAX_QUERY_ROWS: usize = 1_000_000;

fn default_query_timeout_secs() -> u64 {
    30
}

/// Configuration values that parse but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("QUERY_MAX_ROWS must be at least 1")]
    ZeroRowCap,

    #[error("QUERY_MAX_ROWS must be at most {}", MAX_QUERY_ROWS)]
    RowCapTooLarge,

    #[error("QUERY_TIMEOUT_SECS must be at least 1")]
    ZeroTimeout,

    #[error("NOTIFY_WEBHOOK_URL and NOTIFY_WEBHOOK_SECRET must be set together")]
    PartialNotifier,

    #[error("NOTIFY_WEBHOOK_URL is invalid: {0}")]
    NotifierUrl(String),
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Values cannot be parsed into expected types
    /// - Values parse but are unusable (see [`Config::validate`])
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_max_rows == 0 {
            return Err(ConfigError::ZeroRowCap);
        }
        if self.query_max_rows > MAX_QUERY_ROWS {
            return Err(ConfigError::RowCapTooLarge);
        }
        if self.query_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        match (&self.notify_webhook_url, &self.notify_webhook_secret) {
            (Some(url), Some(_)) => {
                validate_webhook_url(url).map_err(|e| ConfigError::NotifierUrl(e.to_string()))
            }
            (None, None) => Ok(()),
            _ => Err(ConfigError::PartialNotifier),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            database_url: "postgres://localhost/keygate".to_string(),
            server_port: default_port(),
            database_max_connections: default_max_connections(),
            query_max_rows: default_query_max_rows(),
            query_timeout_secs: default_query_timeout_secs(),
            degraded_start: false,
            notify_webhook_url: None,
            notify_webhook_secret: None,
        }
    }

    #[test]
    fn defaults_from_env_map() {
        let vars = vec![("DATABASE_URL".to_string(), "postgres://db/app".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.query_max_rows, 10_000);
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
        assert!(!config.degraded_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_database_url_fails() {
        let vars: Vec<(String, String)> = Vec::new();
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }

    #[test]
    fn rejects_zero_row_cap() {
        let config = Config {
            query_max_rows: 0,
            ..base()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroRowCap)));
    }

    #[test]
    fn rejects_row_cap_above_ceiling() {
        let config = Config {
            query_max_rows: MAX_QUERY_ROWS,
            ..base()
        };
        assert!(config.validate().is_ok());

        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/keygate".to_string()),
            ("QUERY_MAX_ROWS".to_string(), usize::MAX.to_string()),
        ];
        let config = envy::from_iter::<_, Config>(vars).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RowCapTooLarge)
        ));
    }

    #[test]
    fn notifier_settings_must_come_together() {
        let config = Config {
            notify_webhook_url: Some("https://relay.example.com".to_string()),
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PartialNotifier)
        ));

        let config = Config {
            notify_webhook_url: Some("http://relay.example.com".to_string()),
            notify_webhook_secret: Some("s3cret".to_string()),
            ..base()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotifierUrl(_))));
    }
}
