//! Migration run configuration.
//!
//! `MigrationConfig` can be assembled from connection URLs (CLI flags and
//! environment) or loaded from a JSON file shaped like:
//!
//! ```json
//! {
//!   "mysql":    { "host": "localhost", "user": "root", "password": "pw", "database": "shop" },
//!   "postgres": { "host": "localhost", "user": "postgres", "database": "shop", "port": 5432 },
//!   "options":  { "tables": [], "batchSize": 1000, "resetSequences": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use url::Url;
use zeroize::Zeroizing;

/// Default number of rows per INSERT statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Tunables for a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MigrationOptions {
    /// Tables to migrate; empty means every source table
    pub tables: Vec<String>,
    /// Honor source primary-key markers
    pub primary: bool,
    /// Append NOT NULL for non-nullable source columns
    pub not_null: bool,
    /// Append DEFAULT for columns with a source default
    #[serde(rename = "default")]
    pub default_values: bool,
    /// Restart target sequences after the table loop
    pub reset_sequences: bool,
    /// Maximum rows per INSERT statement
    pub batch_size: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            primary: true,
            not_null: true,
            default_values: true,
            reset_sequences: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl MigrationOptions {
    /// Validates option values.
    ///
    /// # Errors
    /// Returns a configuration error when `batch_size` is zero
    pub fn validate(&self) -> crate::Result<()> {
        if self.batch_size == 0 {
            return Err(crate::error::MigrationError::configuration(
                "batch_size must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Builder method to restrict the run to specific tables.
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method to toggle sequence reconciliation.
    pub fn with_reset_sequences(mut self, reset_sequences: bool) -> Self {
        self.reset_sequences = reset_sequences;
        self
    }

    /// Restricts `available` to the configured table filter, keeping source order.
    pub fn select_tables(&self, available: Vec<String>) -> Vec<String> {
        if self.tables.is_empty() {
            return available;
        }
        let wanted: HashSet<&str> = self.tables.iter().map(String::as_str).collect();
        available
            .into_iter()
            .filter(|t| wanted.contains(t.as_str()))
            .collect()
    }
}

/// Host/user/password description of one database, as found in config files.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DatabaseEndpoint {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<Zeroizing<String>>,
    pub database: String,
}

impl std::fmt::Debug for DatabaseEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            // password intentionally omitted
            .finish_non_exhaustive()
    }
}

impl DatabaseEndpoint {
    /// Builds a driver URL such as `mysql://user:pw@host:3306/db`.
    ///
    /// # Errors
    /// Returns a configuration error when host or database is missing
    pub fn to_url(&self, scheme: &str, default_port: u16) -> crate::Result<Zeroizing<String>> {
        if self.host.is_empty() {
            return Err(crate::error::MigrationError::configuration(format!(
                "{} host is required",
                scheme
            )));
        }
        if self.database.is_empty() {
            return Err(crate::error::MigrationError::configuration(format!(
                "{} database is required",
                scheme
            )));
        }

        let base = format!(
            "{}://{}:{}",
            scheme,
            self.host,
            self.port.unwrap_or(default_port)
        );
        let mut url = Url::parse(&base).map_err(|e| {
            crate::error::MigrationError::configuration(format!("Invalid {} host: {}", scheme, e))
        })?;
        url.set_path(&format!("/{}", self.database));

        let invalid_credentials = |_| {
            crate::error::MigrationError::configuration(format!(
                "Cannot set credentials on {} URL",
                scheme
            ))
        };
        if let Some(user) = &self.user {
            url.set_username(user).map_err(invalid_credentials)?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password.as_str()))
                .map_err(invalid_credentials)?;
        }

        Ok(Zeroizing::new(url.into()))
    }
}

/// Full configuration of a migration: both endpoints plus options.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Source connection URL (`mysql://...`)
    #[serde(skip)]
    pub source_url: Option<Zeroizing<String>>,
    /// Target connection URL (`postgres://...`)
    #[serde(skip)]
    pub target_url: Option<Zeroizing<String>>,
    #[serde(default)]
    pub mysql: Option<DatabaseEndpoint>,
    #[serde(default)]
    pub postgres: Option<DatabaseEndpoint>,
    #[serde(default)]
    pub options: MigrationOptions,
}

impl std::fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationConfig")
            .field(
                "source_url",
                &self
                    .source_url
                    .as_ref()
                    .map(|u| crate::error::redact_database_url(u)),
            )
            .field(
                "target_url",
                &self
                    .target_url
                    .as_ref()
                    .map(|u| crate::error::redact_database_url(u)),
            )
            .field("mysql", &self.mysql)
            .field("postgres", &self.postgres)
            .field("options", &self.options)
            .finish()
    }
}

impl MigrationConfig {
    /// Creates a configuration from two connection URLs.
    pub fn from_urls(source_url: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            source_url: Some(Zeroizing::new(source_url.into())),
            target_url: Some(Zeroizing::new(target_url.into())),
            ..Default::default()
        }
    }

    /// Loads a JSON configuration file.
    ///
    /// # Errors
    /// Returns an I/O error when the file cannot be read and a serialization
    /// error when it is not valid configuration JSON
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
                crate::error::MigrationError::Io {
                    context: format!("Failed to read config file {}", path.display()),
                    source: e,
                }
            })?);
        Self::from_json(&contents)
    }

    /// Parses configuration JSON.
    ///
    /// # Errors
    /// Returns a serialization error on malformed input
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::error::MigrationError::Serialization {
            context: "Invalid migration config".to_string(),
            source: e,
        })
    }

    /// Builder method to set the source URL, overriding any `mysql` section.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(Zeroizing::new(url.into()));
        self
    }

    /// Builder method to set the target URL, overriding any `postgres` section.
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(Zeroizing::new(url.into()));
        self
    }

    /// Builder method to replace the options.
    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolves the source URL, preferring an explicit URL over the `mysql` section.
    ///
    /// # Errors
    /// Returns a configuration error when no source is configured
    pub fn resolved_source_url(&self) -> crate::Result<Zeroizing<String>> {
        if let Some(url) = &self.source_url {
            return Ok(url.clone());
        }
        match &self.mysql {
            Some(endpoint) => endpoint.to_url("mysql", 3306),
            None => Err(crate::error::MigrationError::configuration(
                "Missing source database configuration (mysql)",
            )),
        }
    }

    /// Resolves the target URL, preferring an explicit URL over the `postgres` section.
    ///
    /// # Errors
    /// Returns a configuration error when no target is configured
    pub fn resolved_target_url(&self) -> crate::Result<Zeroizing<String>> {
        if let Some(url) = &self.target_url {
            return Ok(url.clone());
        }
        match &self.postgres {
            Some(endpoint) => endpoint.to_url("postgres", 5432),
            None => Err(crate::error::MigrationError::configuration(
                "Missing target database configuration (postgres)",
            )),
        }
    }

    /// Validates that both endpoints and the options are usable.
    ///
    /// # Errors
    /// Returns the first configuration problem found
    pub fn validate(&self) -> crate::Result<()> {
        self.resolved_source_url()?;
        self.resolved_target_url()?;
        self.options.validate()
    }
}
