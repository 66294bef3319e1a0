//! API configuration
//!
//! Every setting can be overridden with an `API_`-prefixed environment
//! variable (`API_PORT=9000`, `API_STORE=postgres`, ...). A `.env` file is
//! honoured by the server binary before this is loaded.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use core_kernel::{CoreError, Currency};
use infra_db::DatabaseConfig;

/// Which claim store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Postgres,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    pub log_format: LogFormat,
    pub store: StoreKind,
    /// Only read when `store` is `postgres`
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout_secs: u64,
    /// Directory for uploaded supporting documents
    pub upload_dir: PathBuf,
    /// ISO code of the currency claims are paid in
    pub currency: String,
    /// Capacity of the claim notification channel
    pub notification_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            store: StoreKind::Memory,
            database_url: "postgres://localhost/lecturer_claims".to_string(),
            database_max_connections: 10,
            database_min_connections: 2,
            database_connect_timeout_secs: 30,
            upload_dir: PathBuf::from("uploads"),
            currency: "ZAR".to_string(),
            notification_capacity: 256,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment, on top of the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as u64)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_secs", defaults.jwt_expiration_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .set_default("store", "memory")?
            .set_default("database_url", defaults.database_url)?
            .set_default("database_max_connections", defaults.database_max_connections as u64)?
            .set_default("database_min_connections", defaults.database_min_connections as u64)?
            .set_default("database_connect_timeout_secs", defaults.database_connect_timeout_secs)?
            .set_default("upload_dir", "uploads")?
            .set_default("currency", defaults.currency)?
            .set_default("notification_capacity", defaults.notification_capacity as u64)?
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool settings for the Postgres claim store
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.database_max_connections)
            .min_connections(self.database_min_connections)
            .connect_timeout(Duration::from_secs(self.database_connect_timeout_secs))
    }

    /// The configured claim currency
    pub fn currency(&self) -> Result<Currency, CoreError> {
        Ok(self.currency.parse::<Currency>()?)
    }

    /// Rejects settings the server cannot start with
    pub fn validate(&self) -> Result<(), CoreError> {
        self.currency()?;
        if self.jwt_secret.trim().is_empty() {
            return Err(CoreError::configuration("jwt_secret must not be empty"));
        }
        if self.store == StoreKind::Postgres {
            self.database()
                .validate()
                .map_err(|e| CoreError::configuration(format!("database: {}", e)))?;
        }
        if self.notification_capacity == 0 {
            return Err(CoreError::configuration("notification_capacity must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_run_in_memory() {
        let config = ApiConfig::default();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.currency().unwrap(), Currency::ZAR);
        assert!(config.validate().is_ok());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let config = ApiConfig {
            currency: "XYZ".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_settings_flow_into_pool_config() {
        let config = ApiConfig {
            database_url: "postgres://db/claims".to_string(),
            database_max_connections: 4,
            database_min_connections: 1,
            database_connect_timeout_secs: 5,
            ..ApiConfig::default()
        };
        let pool = config.database();
        assert_eq!(pool.url, "postgres://db/claims");
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.min_connections, 1);
        assert_eq!(pool.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_postgres_rejects_inverted_pool_limits() {
        let config = ApiConfig {
            store: StoreKind::Postgres,
            database_max_connections: 1,
            database_min_connections: 3,
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_requires_url() {
        let config = ApiConfig {
            store: StoreKind::Postgres,
            database_url: String::new(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
