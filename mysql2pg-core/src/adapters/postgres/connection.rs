//! PostgreSQL connection pool management and validation.

use super::{ConnectionConfig, PostgresTarget};
use crate::Result;
use crate::error::{MigrationError, redact_database_url};
use sqlx::PgPool;

/// Default PostgreSQL port.
pub const POSTGRES_DEFAULT_PORT: u16 = 5432;

impl PostgresTarget {
    /// Creates a PostgreSQL target with a lazily connecting pool.
    ///
    /// # Arguments
    /// * `connection_string` - PostgreSQL connection URL (credentials sanitized in errors)
    ///
    /// # Errors
    /// Returns error if the connection string is invalid or the pool cannot be created
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let config = parse_postgres_connection_config(connection_string)?;
        Self::with_config(connection_string, config).await
    }

    /// Creates a PostgreSQL target with custom pool configuration.
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let pool = create_connection_pool(connection_string, &config)?;
        Ok(Self { pool, config })
    }

    /// Verifies that the server is reachable and accepts writes.
    pub async fn test_connection(&self) -> Result<()> {
        let read_only: String = sqlx::query_scalar("SHOW transaction_read_only")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                MigrationError::connection_failed(
                    format!("Cannot reach PostgreSQL server at {}", self.config),
                    e,
                )
            })?;

        if read_only == "on" {
            return Err(MigrationError::configuration(
                "PostgreSQL target session is read-only",
            ));
        }

        Ok(())
    }

    /// Closes the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Parses a PostgreSQL connection string into pool configuration.
pub fn parse_postgres_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
    let config = ConnectionConfig::from_url(
        connection_string,
        &["postgres", "postgresql"],
        POSTGRES_DEFAULT_PORT,
    )?;

    if let Some(database) = &config.database
        && database.len() > 63
    {
        return Err(MigrationError::configuration(
            "Database name too long: maximum 63 characters",
        ));
    }

    Ok(config)
}

fn create_connection_pool(connection_string: &str, config: &ConnectionConfig) -> Result<PgPool> {
    use sqlx::Executor;

    let read_only = config.read_only;

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections.min(100))
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                let app_name = format!("mysql2pg-{}", env!("CARGO_PKG_VERSION"));
                conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                    .await?;

                if read_only {
                    conn.execute("SET default_transaction_read_only = on")
                        .await?;
                }

                conn.execute("SET timezone = 'UTC'").await?;
                Ok(())
            })
        })
        .connect_lazy(connection_string)
        .map_err(|e| {
            MigrationError::connection_failed(
                format!(
                    "Failed to create PostgreSQL connection pool to {}",
                    redact_database_url(connection_string)
                ),
                e,
            )
        })
}
