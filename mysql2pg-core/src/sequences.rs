//! Post-load sequence reconciliation on the target.
//!
//! Rows are copied with their original key values, so every sequence created
//! by a `SERIAL`/`BIGSERIAL` column still starts at 1 after the load. The
//! reconciler discovers each sequence owned by a table and restarts it just
//! above the table's current maximum key.

use crate::Result;
use crate::adapters::TargetExecutor;
use crate::adapters::helpers::{qualify, quote_ident, quote_literal};
use crate::error::MigrationError;
use crate::models::{RowRecord, SequenceBinding, SequenceRestart, SourceValue};
use tracing::{debug, info};

/// Column used when a table has no primary key.
pub const FALLBACK_KEY_COLUMN: &str = "id";

const DISCOVER_SEQUENCES_SQL: &str = "\
SELECT sn.nspname AS sequence_schema, s.relname AS sequence_name, \
tn.nspname AS table_schema, t.relname AS table_name \
FROM pg_class s \
JOIN pg_namespace sn ON sn.oid = s.relnamespace \
JOIN pg_depend d ON d.objid = s.oid \
AND d.classid = 'pg_class'::regclass AND d.refclassid = 'pg_class'::regclass \
JOIN pg_class t ON t.oid = d.refobjid \
JOIN pg_namespace tn ON tn.oid = t.relnamespace \
WHERE s.relkind = 'S' AND t.relkind = 'r' \
ORDER BY sn.nspname, s.relname";

/// Restart value for a sequence whose table currently holds `max_key`.
///
/// An empty table reports a maximum of 0 and restarts at 1.
pub fn restart_value(max_key: i64) -> i64 {
    max_key.saturating_add(1)
}

/// Restarts table-owned sequences after a load.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceReconciler;

impl SequenceReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Reconciles every sequence bound to a table on the target.
    ///
    /// Bindings are handled one at a time in discovery order. The first
    /// failure stops reconciliation and is returned as a
    /// [`MigrationError::Reconciliation`]; restarts applied before it stay
    /// applied.
    pub async fn reconcile(&self, target: &dyn TargetExecutor) -> Result<Vec<SequenceRestart>> {
        let bindings = discover_sequences(target)
            .await
            .map_err(|e| MigrationError::reconciliation_failed("Failed to discover sequences", e))?;

        debug!("Discovered {} table-owned sequences", bindings.len());

        let mut restarts = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            let restart = reconcile_binding(target, binding).await.map_err(|e| {
                MigrationError::reconciliation_failed(
                    format!(
                        "Failed to reset sequence {}.{}",
                        binding.sequence_schema, binding.sequence_name
                    ),
                    e,
                )
            })?;
            info!(
                "Reset sequence {} to {} (max of {}.{})",
                restart.sequence, restart.restart_with, restart.table, restart.primary_key_column
            );
            restarts.push(restart);
        }

        Ok(restarts)
    }
}

async fn discover_sequences(target: &dyn TargetExecutor) -> Result<Vec<SequenceBinding>> {
    target
        .query(DISCOVER_SEQUENCES_SQL)
        .await?
        .iter()
        .map(|row| {
            Ok(SequenceBinding {
                sequence_schema: text_field(row, "sequence_schema")?,
                sequence_name: text_field(row, "sequence_name")?,
                table_schema: text_field(row, "table_schema")?,
                table_name: text_field(row, "table_name")?,
            })
        })
        .collect()
}

async fn reconcile_binding(
    target: &dyn TargetExecutor,
    binding: &SequenceBinding,
) -> Result<SequenceRestart> {
    let table = qualify(&binding.table_schema, &binding.table_name);
    let key_column = primary_key_column(target, &table).await?;

    let max_sql = format!(
        "SELECT COALESCE(MAX({}), 0)::bigint AS max_value FROM {}",
        quote_ident(&key_column),
        table
    );
    let rows = target.query(&max_sql).await?;
    let max_key = rows
        .first()
        .and_then(|row| row.get("max_value"))
        .and_then(SourceValue::as_i64)
        .ok_or_else(|| {
            MigrationError::query_failed(format!("No maximum key returned for {}", table))
        })?;

    let restart_with = restart_value(max_key);
    let sequence = qualify(&binding.sequence_schema, &binding.sequence_name);
    target
        .execute(&format!(
            "ALTER SEQUENCE {} RESTART WITH {}",
            sequence, restart_with
        ))
        .await?;

    Ok(SequenceRestart {
        sequence: format!("{}.{}", binding.sequence_schema, binding.sequence_name),
        table: format!("{}.{}", binding.table_schema, binding.table_name),
        primary_key_column: key_column,
        restart_with,
    })
}

/// First primary-key column of `table`, or [`FALLBACK_KEY_COLUMN`].
async fn primary_key_column(target: &dyn TargetExecutor, table: &str) -> Result<String> {
    let sql = format!(
        "SELECT a.attname AS column_name \
         FROM pg_index i \
         JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
         WHERE i.indrelid = {}::regclass AND i.indisprimary \
         ORDER BY a.attnum LIMIT 1",
        quote_literal(table)
    );
    let rows = target.query(&sql).await?;
    Ok(rows
        .first()
        .and_then(|row| row.get("column_name"))
        .and_then(SourceValue::as_str)
        .map_or_else(|| FALLBACK_KEY_COLUMN.to_string(), str::to_string))
}

fn text_field(row: &RowRecord, column: &str) -> Result<String> {
    row.get(column)
        .and_then(SourceValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            MigrationError::query_failed(format!("Catalog row is missing column '{}'", column))
        })
}
