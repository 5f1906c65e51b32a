//! MySQL connection pool management and validation.
//!
//! The source pool is opened read-only with the session time zone pinned to
//! UTC so `TIMESTAMP` values decode identically on every host.

use super::{ConnectionConfig, MySqlSource};
use crate::Result;
use crate::error::{MigrationError, redact_database_url};
use sqlx::MySqlPool;

/// Default MySQL port.
pub const MYSQL_DEFAULT_PORT: u16 = 3306;

impl MySqlSource {
    /// Creates a MySQL source with a lazily connecting pool.
    ///
    /// # Arguments
    /// * `connection_string` - MySQL connection URL (credentials sanitized in errors)
    ///
    /// # Errors
    /// Returns error if the connection string is invalid or the pool cannot be created
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let config = parse_mysql_connection_config(connection_string)?;
        Self::with_config(connection_string, config).await
    }

    /// Creates a MySQL source with custom pool configuration.
    ///
    /// The session is always read-only regardless of `config.read_only`.
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        let config = config.read_only(true);
        config.validate()?;

        let pool = create_mysql_connection_pool(connection_string, &config)?;
        Ok(Self { pool, config })
    }

    /// Verifies that the server is reachable and a database is selected.
    pub async fn test_connection(&self) -> Result<()> {
        let database: Option<String> = sqlx::query_scalar("SELECT DATABASE()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                MigrationError::connection_failed(
                    format!("Cannot reach MySQL server at {}", self.config),
                    e,
                )
            })?;

        if database.is_none() {
            return Err(MigrationError::configuration(
                "MySQL connection string must name a database",
            ));
        }

        Ok(())
    }

    /// Closes the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Parses a MySQL connection string into pool configuration.
pub fn parse_mysql_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
    let config =
        ConnectionConfig::from_url(connection_string, &["mysql", "mariadb"], MYSQL_DEFAULT_PORT)?;

    if config.database.is_none() {
        return Err(MigrationError::configuration(
            "MySQL connection string must name a database",
        ));
    }

    if let Some(username) = &config.username
        && username.len() > 32
    {
        return Err(MigrationError::configuration(
            "Username too long: maximum 32 characters for MySQL",
        ));
    }

    Ok(config)
}

/// Creates a MySQL connection pool with proper configuration
fn create_mysql_connection_pool(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<MySqlPool> {
    use sqlx::Executor;

    let read_only = config.read_only;

    sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(config.max_connections.min(100))
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if read_only {
                    conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                }
                conn.execute("SET time_zone = '+00:00'").await?;
                Ok(())
            })
        })
        .connect_lazy(connection_string)
        .map_err(|e| {
            MigrationError::connection_failed(
                format!(
                    "Failed to create MySQL connection pool to {}",
                    redact_database_url(connection_string)
                ),
                e,
            )
        })
}
