//! Database connection pool management
//!
//! The claims service opens one pool at startup and shares it between the
//! claim store and the lecturer directory. Connections identify themselves
//! with an application name so claim traffic is visible in
//! `pg_stat_activity`.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// Application name reported by claim store connections
pub const DEFAULT_APPLICATION_NAME: &str = "lecturer-claims";

/// Pool settings for the claims database
///
/// # Example
///
/// ```rust
/// use infra_db::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("postgres://localhost/lecturer_claims")
///     .max_connections(20)
///     .min_connections(5)
///     .connect_timeout(Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a free connection before the store reports
    /// itself unavailable
    pub connect_timeout: Duration,
    pub application_name: String,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Rejects pool settings that cannot serve the claim store
    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.url.trim().is_empty() {
            return Err(DatabaseError::ConnectionFailed(
                "database url is empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(DatabaseError::ConnectionFailed(
                "max_connections must be positive".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(DatabaseError::ConnectionFailed(format!(
                "min_connections {} exceeds max_connections {}",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    fn connect_options(&self) -> Result<PgConnectOptions, DatabaseError> {
        PgConnectOptions::from_str(&self.url)
            .map(|options| options.application_name(&self.application_name))
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
    }
}

/// Opens the claims database pool
///
/// # Errors
///
/// `DatabaseError::ConnectionFailed` for invalid settings or when no
/// connection can be established.
///
/// # Example
///
/// ```rust,ignore
/// use infra_db::{create_pool, DatabaseConfig};
///
/// let pool = create_pool(DatabaseConfig::new("postgres://localhost/lecturer_claims")).await?;
/// ```
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    config.validate()?;
    let options = config.connect_options()?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        application = %config.application_name,
        "Opening claims database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Claims database pool ready");
    Ok(pool)
}

/// Applies the embedded claims schema migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Claims schema migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_name_the_application() {
        let config = DatabaseConfig::new("postgres://localhost/lecturer_claims");
        assert_eq!(config.application_name, DEFAULT_APPLICATION_NAME);
        assert!(config.validate().is_ok());
        assert!(config.connect_options().is_ok());
    }

    #[test]
    fn test_min_above_max_rejected() {
        let config = DatabaseConfig::new("postgres://test")
            .max_connections(2)
            .min_connections(5);
        assert!(matches!(
            config.validate(),
            Err(DatabaseError::ConnectionFailed(_))
        ));
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(DatabaseConfig::new("  ").validate().is_err());
        assert!(DatabaseConfig::new("postgres://x")
            .max_connections(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_malformed_url_rejected() {
        let config = DatabaseConfig::new("not a url");
        assert!(config.connect_options().is_err());
    }
}
