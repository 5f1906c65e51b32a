//! MySQL source adapter.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `rows`: Decoding of result rows into [`SourceValue`](crate::models::SourceValue) cells
//!
//! # Guarantees
//! - Sessions are read-only and run in UTC
//! - Connection strings are sanitized in error messages
//! - Table data is streamed, never fetched whole

pub mod connection;
pub mod rows;


use super::helpers::{RowExt, quote_mysql_ident};
use super::{ConnectionConfig, SourceCatalog};
use crate::Result;
use crate::error::MigrationError;
use crate::models::{ColumnDescriptor, RowRecord};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::MySqlPool;

/// Rows buffered between the reading task and the consumer of
/// [`SourceCatalog::read_rows`].
const ROW_BUFFER: usize = 256;

/// MySQL implementation of [`SourceCatalog`].
pub struct MySqlSource {
    /// Connection pool for database operations
    pub pool: MySqlPool,
    /// Connection configuration (pool settings, timeouts, etc.)
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for MySqlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSource")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SourceCatalog for MySqlSource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        // Cast to CHAR to avoid VARBINARY type issues in MySQL 8.0+
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrationError::source_failed("Failed to list tables", e))?;

        rows.iter()
            .map(|row| row.get_field::<String>("TABLE_NAME", None))
            .collect()
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        // Same columns DESCRIBE reports, in declaration order
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR) AS FIELD,
                CAST(COLUMN_TYPE AS CHAR) AS COLUMN_TYPE,
                CAST(IS_NULLABLE AS CHAR) AS IS_NULLABLE,
                CAST(COLUMN_KEY AS CHAR) AS COLUMN_KEY,
                CAST(COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT,
                CAST(EXTRA AS CHAR) AS EXTRA
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows = sqlx::query(query)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                MigrationError::source_failed(
                    format!("Failed to describe columns of table '{}'", table),
                    e,
                )
            })?;

        if rows.is_empty() {
            return Err(MigrationError::query_failed(format!(
                "Table '{}' has no columns or does not exist",
                table
            )));
        }

        rows.iter()
            .map(|row| {
                Ok(column_descriptor(
                    row.get_field("FIELD", Some(table))?,
                    row.get_field("COLUMN_TYPE", Some(table))?,
                    &row.get_field::<String>("IS_NULLABLE", Some(table))?,
                    &row.get_field::<String>("COLUMN_KEY", Some(table))?,
                    row.get_field("COLUMN_DEFAULT", Some(table))?,
                    &row.get_field::<String>("EXTRA", Some(table))?,
                ))
            })
            .collect()
    }

    fn read_rows<'a>(&'a self, table: &'a str) -> BoxStream<'a, Result<RowRecord>> {
        let pool = self.pool.clone();
        let table = table.to_string();
        let (tx, rx) = tokio::sync::mpsc::channel(ROW_BUFFER);

        tokio::spawn(async move {
            let sql = format!("SELECT * FROM {}", quote_mysql_ident(&table));
            let mut stream = sqlx::query(&sql).fetch(&pool);
            while let Some(next) = stream.next().await {
                let item = next
                    .map_err(|e| {
                        MigrationError::source_failed(
                            format!("Failed to read rows from table '{}'", table),
                            e,
                        )
                    })
                    .and_then(|row| rows::decode_row(&row, &table));
                let failed = item.is_err();
                // A closed channel means the consumer gave up on this table
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed()
    }
}

/// Builds a [`ColumnDescriptor`] from one `DESCRIBE`-shaped catalog row.
///
/// `nullable` is `YES`/`NO`, `key` is `PRI` for primary-key members, and
/// `extra` carries `auto_increment`.
pub fn column_descriptor(
    name: String,
    column_type: String,
    nullable: &str,
    key: &str,
    default_value: Option<String>,
    extra: &str,
) -> ColumnDescriptor {
    ColumnDescriptor {
        name,
        source_type: column_type,
        is_auto_increment: extra.to_lowercase().contains("auto_increment"),
        is_primary_key: key.eq_ignore_ascii_case("PRI"),
        is_nullable: nullable.eq_ignore_ascii_case("YES"),
        default_value,
    }
}
