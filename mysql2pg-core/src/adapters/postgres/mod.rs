//! PostgreSQL target adapter.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `rows`: Decoding of catalog query results into [`RowRecord`]s
//!
//! Generated DDL and INSERT statements carry their values inline, so they
//! are sent over the simple query protocol rather than prepared.

mod connection;
mod rows;


use super::{ConnectionConfig, TargetExecutor};
use crate::Result;
use crate::error::MigrationError;
use crate::models::RowRecord;
use async_trait::async_trait;
use sqlx::PgPool;

pub use connection::{POSTGRES_DEFAULT_PORT, parse_postgres_connection_config};

/// PostgreSQL implementation of [`TargetExecutor`].
pub struct PostgresTarget {
    pub pool: PgPool,
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for PostgresTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresTarget")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl TargetExecutor for PostgresTarget {
    async fn execute(&self, statement: &str) -> Result<u64> {
        let result = sqlx::raw_sql(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| MigrationError::target_failed(statement_context(statement), e))?;
        Ok(result.rows_affected())
    }

    async fn query(&self, statement: &str) -> Result<Vec<RowRecord>> {
        let rows = sqlx::query(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrationError::target_failed(statement_context(statement), e))?;

        rows.iter().map(rows::decode_row).collect()
    }
}

/// Short description of a statement for error messages.
///
/// INSERT statements can be megabytes of row data, so only the leading
/// keywords and target are kept.
fn statement_context(statement: &str) -> String {
    const MAX_CONTEXT: usize = 120;
    let trimmed = statement.trim();
    match trimmed.char_indices().nth(MAX_CONTEXT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
