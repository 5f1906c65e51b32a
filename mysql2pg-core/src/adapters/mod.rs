//! Capability traits consumed by the migration engine, plus the concrete
//! database adapters that implement them.
//!
//! The engine only ever talks to a [`SourceCatalog`] and a
//! [`TargetExecutor`]; how connections are opened and closed is the
//! adapters' business.
//!
//! # Module Structure
//! - `config`: Configuration types (ConnectionConfig, MigrationOptions, MigrationConfig)
//! - `helpers`: Identifier/literal quoting and row extraction helpers
//! - `mysql`: sqlx-backed MySQL source (feature `mysql`)
//! - `postgres`: sqlx-backed PostgreSQL target (feature `postgresql`)

use crate::Result;
use crate::models::{ColumnDescriptor, RowRecord};
use async_trait::async_trait;
use futures::stream::BoxStream;

pub mod config;
pub mod helpers;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "postgresql")]
pub mod postgres;

pub use config::{
    ConnectionConfig, DEFAULT_BATCH_SIZE, DatabaseEndpoint, MigrationConfig, MigrationOptions,
};

/// Read access to the source schema and its rows.
///
/// # Object Safety
/// This trait is object-safe, allowing `&dyn SourceCatalog` in the engine.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Lists every base table in the source database, in catalog order.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Describes the columns of `table` in declaration order.
    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;

    /// Streams every row of `table`.
    ///
    /// Rows are produced lazily so the engine holds at most one batch in
    /// memory; an error item ends the table's migration.
    fn read_rows<'a>(&'a self, table: &'a str) -> BoxStream<'a, Result<RowRecord>>;
}

/// Statement execution against the target database.
#[async_trait]
pub trait TargetExecutor: Send + Sync {
    /// Executes a DDL or DML statement, returning the affected row count.
    async fn execute(&self, statement: &str) -> Result<u64>;

    /// Runs a query and returns its rows.
    async fn query(&self, statement: &str) -> Result<Vec<RowRecord>>;
}
