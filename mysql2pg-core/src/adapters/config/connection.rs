//! Database connection configuration.
//!
//! This module provides the `ConnectionConfig` struct for configuring
//! source and target connection pools.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Configuration for a database connection pool.
///
/// # Security
/// This struct intentionally does NOT store passwords or credentials.
/// The password stays inside the connection URL handed to the driver.
///
/// # Example
/// ```rust
/// use mysql2pg_core::adapters::ConnectionConfig;
///
/// let config = ConnectionConfig::new("localhost".to_string())
///     .with_port(5432)
///     .with_database("app".to_string())
///     .with_username("admin".to_string());
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host address
    pub host: String,
    /// Optional port number
    pub port: Option<u16>,
    /// Optional database name
    pub database: Option<String>,
    /// Optional username (password handled separately)
    pub username: Option<String>,
    /// Time allowed to acquire a connection
    pub connect_timeout: Duration,
    /// Maximum number of connections in pool
    pub max_connections: u32,
    /// Whether to put sessions into read-only mode
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
            max_connections: 1,
            read_only: false,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectionConfig({}{}{})",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{}", p)),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
        // Intentionally omit username and never include credentials
    }
}

impl ConnectionConfig {
    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.is_empty() {
            return Err(crate::error::MigrationError::configuration(
                "host cannot be empty",
            ));
        }

        if self.port == Some(0) {
            return Err(crate::error::MigrationError::configuration(
                "port must be greater than 0",
            ));
        }

        if self.max_connections == 0 {
            return Err(crate::error::MigrationError::configuration(
                "max_connections must be greater than 0",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(crate::error::MigrationError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Creates a new connection config with defaults.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Builder method to request read-only sessions.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Parses a connection URL into a validated configuration.
    ///
    /// # Arguments
    /// * `connection_string` - Database URL (credentials sanitized in errors)
    /// * `schemes` - Accepted URL schemes, e.g. `["mysql"]`
    /// * `default_port` - Port used when the URL omits one
    ///
    /// Recognized query parameters are `connect_timeout` (seconds, 1-300) and
    /// `pool_max_conns` (1-100); anything else is left for the driver.
    pub fn from_url(
        connection_string: &str,
        schemes: &[&str],
        default_port: u16,
    ) -> crate::Result<Self> {
        let url = Url::parse(connection_string).map_err(|e| {
            crate::error::MigrationError::configuration(format!(
                "Invalid connection string format ({}): {}",
                crate::error::redact_database_url(connection_string),
                e
            ))
        })?;

        if !schemes.contains(&url.scheme()) {
            return Err(crate::error::MigrationError::configuration(format!(
                "Connection string must use one of the schemes: {}",
                schemes
                    .iter()
                    .map(|s| format!("{}://", s))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let host = url.host_str().ok_or_else(|| {
            crate::error::MigrationError::configuration("Connection string must specify a host")
        })?;

        let mut config = Self::new(host.to_string()).with_port(url.port().unwrap_or(default_port));

        let database = url.path().trim_start_matches('/');
        if !database.is_empty() {
            config = config.with_database(database.to_string());
        }

        if !url.username().is_empty() {
            config = config.with_username(url.username().to_string());
        }

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "connect_timeout" => {
                    if let Ok(timeout_secs) = value.parse::<u64>()
                        && timeout_secs > 0
                        && timeout_secs <= 300
                    {
                        config.connect_timeout = Duration::from_secs(timeout_secs);
                    }
                }
                "pool_max_conns" => {
                    if let Ok(max_conns) = value.parse::<u32>()
                        && max_conns > 0
                        && max_conns <= 100
                    {
                        config.max_connections = max_conns;
                    }
                }
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }
}
