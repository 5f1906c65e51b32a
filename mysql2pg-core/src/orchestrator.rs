//! Table-by-table migration driver.
//!
//! [`Migrator`] walks the source tables in catalog order. Each table is
//! recreated on the target and its rows copied in batches; a failure in one
//! table is recorded in the [`MigrationStatus`] and the run moves on to the
//! next. Sequence reconciliation runs once after the loop.

use crate::Result;
use crate::adapters::helpers::quote_ident;
use crate::adapters::{MigrationOptions, SourceCatalog, TargetExecutor};
use crate::encoder::{PostgresValueEncoder, ValueEncoder};
use crate::error::MigrationError;
use crate::models::{ColumnDescriptor, MigrationStatus, RowRecord};
use crate::sequences::SequenceReconciler;
use crate::typemap::{PostgresTypeMapper, TypeMapper};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Drives a one-shot migration from a [`SourceCatalog`] into a
/// [`TargetExecutor`].
///
/// # Example
/// ```rust,no_run
/// use mysql2pg_core::adapters::{MigrationOptions, SourceCatalog, TargetExecutor};
/// use mysql2pg_core::orchestrator::Migrator;
/// use tokio_util::sync::CancellationToken;
///
/// async fn run(source: &dyn SourceCatalog, target: &dyn TargetExecutor) {
///     let status = Migrator::new()
///         .run(source, target, &MigrationOptions::default(), &CancellationToken::new())
///         .await;
///     println!("{:?}", status.map(|s| s.succeeded));
/// }
/// ```
#[derive(Clone)]
pub struct Migrator {
    type_mapper: Arc<dyn TypeMapper>,
    value_encoder: Arc<dyn ValueEncoder>,
    reconciler: SequenceReconciler,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator").finish_non_exhaustive()
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    /// Creates a migrator using the PostgreSQL type mapper and value encoder.
    pub fn new() -> Self {
        Self {
            type_mapper: Arc::new(PostgresTypeMapper),
            value_encoder: Arc::new(PostgresValueEncoder),
            reconciler: SequenceReconciler::new(),
        }
    }

    /// Builder method to replace the type mapper.
    pub fn with_type_mapper(mut self, type_mapper: impl TypeMapper + 'static) -> Self {
        self.type_mapper = Arc::new(type_mapper);
        self
    }

    /// Builder method to replace the value encoder.
    pub fn with_value_encoder(mut self, value_encoder: impl ValueEncoder + 'static) -> Self {
        self.value_encoder = Arc::new(value_encoder);
        self
    }

    /// Runs the migration.
    ///
    /// Per-table errors are captured in the returned status. Only invalid
    /// options, a failure to list source tables, and a reconciliation
    /// failure are returned as `Err`.
    ///
    /// Cancellation is observed before every table and every batch. A table
    /// interrupted mid-copy is recorded as failed, the remaining tables are
    /// skipped, and so is reconciliation.
    ///
    /// # Errors
    /// - `Configuration` when `options` are invalid (nothing is touched)
    /// - `Source` when the table list cannot be read
    /// - `Reconciliation` when a sequence cannot be restarted
    pub async fn run(
        &self,
        source: &dyn SourceCatalog,
        target: &dyn TargetExecutor,
        options: &MigrationOptions,
        cancel: &CancellationToken,
    ) -> Result<MigrationStatus> {
        options.validate()?;

        let mut status = MigrationStatus::new();
        let tables = options.select_tables(source.list_tables().await?);
        info!("Migrating {} tables (run {})", tables.len(), status.run_id);

        for table in &tables {
            if cancel.is_cancelled() {
                warn!("Migration cancelled before table '{}'", table);
                status.cancelled = true;
                break;
            }

            status.begin_table(table);
            info!("Migrating table '{}'", table);

            match self.migrate_table(source, target, table, options, cancel).await {
                Ok(0) => {
                    info!("Table '{}' is empty", table);
                    status.mark_empty(table);
                }
                Ok(rows) => {
                    info!("Table '{}' migrated: {} rows", table, rows);
                    status.mark_succeeded(table, rows);
                }
                Err(MigrationError::Cancelled) => {
                    warn!("Migration cancelled while copying table '{}'", table);
                    status.mark_failed(table, MigrationError::Cancelled.to_string());
                    status.cancelled = true;
                    break;
                }
                Err(e) => {
                    let message = e.detailed_message();
                    error!("Table '{}' failed: {}", table, message);
                    status.mark_failed(table, message);
                }
            }
        }

        info!(
            "Table loop finished: {} succeeded, {} failed, {} empty",
            status.succeeded.len(),
            status.failed.len(),
            status.empty.len()
        );

        if options.reset_sequences && !status.cancelled {
            match self.reconciler.reconcile(target).await {
                Ok(restarts) => status.sequences_reset = restarts,
                Err(e) => {
                    error!("{}", e.detailed_message());
                    return Err(e);
                }
            }
        }

        status.finish();
        Ok(status)
    }

    /// Recreates one table and copies its rows, returning the row count.
    async fn migrate_table(
        &self,
        source: &dyn SourceCatalog,
        target: &dyn TargetExecutor,
        table: &str,
        options: &MigrationOptions,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let mut columns = source.describe_columns(table).await?;
        if !options.primary {
            for column in &mut columns {
                column.is_primary_key = false;
            }
        }

        target
            .execute(&format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table)))
            .await?;

        let create = self.create_table_statement(table, &columns, options);
        debug!("{}", create);
        target.execute(&create).await?;

        let mut rows = source.read_rows(table);
        let mut batch: Vec<RowRecord> = Vec::with_capacity(options.batch_size);
        let mut copied: u64 = 0;

        while let Some(row) = rows.next().await {
            batch.push(row?);
            if batch.len() >= options.batch_size {
                copied += self.insert_batch(target, table, &batch, cancel).await?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            copied += self.insert_batch(target, table, &batch, cancel).await?;
        }

        Ok(copied)
    }

    /// Builds `CREATE TABLE` with one definition per column, in source order.
    pub fn create_table_statement(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        options: &MigrationOptions,
    ) -> String {
        let definitions: Vec<String> = columns
            .iter()
            .map(|column| self.type_mapper.column_definition(column, options))
            .collect();
        format!(
            "CREATE TABLE {} ({})",
            quote_ident(table),
            definitions.join(", ")
        )
    }

    /// Builds a multi-row `INSERT` for `batch`.
    ///
    /// The column list comes from the first row of the batch. Returns `None`
    /// for an empty batch.
    pub fn insert_statement(&self, table: &str, batch: &[RowRecord]) -> Option<String> {
        let first = batch.first()?;
        let columns: Vec<String> = first.columns().map(quote_ident).collect();
        let tuples: Vec<String> = batch
            .iter()
            .map(|row| self.value_encoder.encode_row(row))
            .collect();
        Some(format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_ident(table),
            columns.join(", "),
            tuples.join(", ")
        ))
    }

    async fn insert_batch(
        &self,
        target: &dyn TargetExecutor,
        table: &str,
        batch: &[RowRecord],
        cancel: &CancellationToken,
    ) -> Result<u64> {
        if cancel.is_cancelled() {
            return Err(MigrationError::Cancelled);
        }
        let Some(statement) = self.insert_statement(table, batch) else {
            return Ok(0);
        };
        trace!(
            "Inserting {} rows into '{}' ({} bytes)",
            batch.len(),
            table,
            statement.len()
        );
        target.execute(&statement).await?;
        Ok(batch.len() as u64)
    }
}
