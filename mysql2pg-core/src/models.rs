//! Core data models for a migration run.
//!
//! Column descriptors and row records are produced by a
//! [`SourceCatalog`](crate::adapters::SourceCatalog) and consumed once by the
//! type mapper and value encoder. [`MigrationStatus`] is the only structure
//! that outlives a single table.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One source column as reported by the source catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Raw source type string, e.g. `varchar(255)` or `int(10) unsigned`
    pub source_type: String,
    pub is_auto_increment: bool,
    pub is_primary_key: bool,
    pub is_nullable: bool,
    pub default_value: Option<String>,
}

impl ColumnDescriptor {
    /// Creates a nullable, non-key column with no default.
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            is_auto_increment: false,
            is_primary_key: false,
            is_nullable: true,
            default_value: None,
        }
    }

    /// Builder method to mark the column auto-incrementing.
    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    /// Builder method to mark the column as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Builder method to mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Builder method to set the source default.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

/// Date and time cell values.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalValue {
    Date(NaiveDate),
    Time(NaiveTime),
    /// Wall-clock timestamp without zone (MySQL `DATETIME`)
    DateTime(NaiveDateTime),
    /// Instant in UTC (MySQL `TIMESTAMP` read with a UTC session)
    Timestamp(DateTime<Utc>),
    /// Zero dates and other values the driver could not represent
    Invalid,
}

/// A single cell read from the source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Integer(i64),
    UnsignedInteger(u64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Binary(Vec<u8>),
    Temporal(TemporalValue),
}

impl SourceValue {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Interprets the value as a signed integer where that is lossless.
    ///
    /// Used when reading catalog results such as `MAX(id)` back from the
    /// target.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::UnsignedInteger(v) => i64::try_from(*v).ok(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for SourceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SourceValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for SourceValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Ordered mapping from column name to cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    cells: Vec<(String, SourceValue)>,
}

impl RowRecord {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty row with room for `columns` cells.
    pub fn with_capacity(columns: usize) -> Self {
        Self {
            cells: Vec::with_capacity(columns),
        }
    }

    /// Appends a cell, keeping column order.
    pub fn push(&mut self, column: impl Into<String>, value: SourceValue) {
        self.cells.push((column.into(), value));
    }

    /// Builder variant of [`RowRecord::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SourceValue>) -> Self {
        self.push(column, value.into());
        self
    }

    /// Column names in source order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Cell values in source order.
    pub fn values(&self) -> impl Iterator<Item = &SourceValue> {
        self.cells.iter().map(|(_, value)| value)
    }

    /// Looks up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&SourceValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, SourceValue)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (String, SourceValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// Final outcome of a single table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableOutcome {
    Succeeded,
    Failed,
    Empty,
}

impl std::fmt::Display for TableOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableOutcome::Succeeded => write!(f, "succeeded"),
            TableOutcome::Failed => write!(f, "failed"),
            TableOutcome::Empty => write!(f, "empty"),
        }
    }
}

/// Timing and result details for one attempted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetail {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub row_count: Option<u64>,
    pub error: Option<String>,
}

/// A sequence bound to a table, discovered on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceBinding {
    pub sequence_schema: String,
    pub sequence_name: String,
    pub table_schema: String,
    pub table_name: String,
}

/// A sequence restart that was applied during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRestart {
    pub sequence: String,
    pub table: String,
    pub primary_key_column: String,
    pub restart_with: i64,
}

/// Accumulated result of a migration run.
///
/// Every attempted table appears in exactly one of `succeeded`, `failed` or
/// `empty`, and has an entry in `details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "success")]
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub empty: Vec<String>,
    pub details: BTreeMap<String, TableDetail>,
    pub sequences_reset: Vec<SequenceRestart>,
    pub cancelled: bool,
}

impl Default for MigrationStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationStatus {
    /// Creates an empty status for a new run.
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            completed_at: None,
            succeeded: Vec::new(),
            failed: Vec::new(),
            empty: Vec::new(),
            details: BTreeMap::new(),
            sequences_reset: Vec::new(),
            cancelled: false,
        }
    }

    /// Records the start of a table's migration.
    pub fn begin_table(&mut self, table: &str) {
        self.details.insert(
            table.to_string(),
            TableDetail {
                start_time: Utc::now(),
                end_time: None,
                row_count: None,
                error: None,
            },
        );
    }

    /// Marks a table as fully migrated.
    pub fn mark_succeeded(&mut self, table: &str, row_count: u64) {
        self.succeeded.push(table.to_string());
        let detail = self.finish_detail(table);
        detail.row_count = Some(row_count);
    }

    /// Marks a table as migrated with no rows.
    pub fn mark_empty(&mut self, table: &str) {
        self.empty.push(table.to_string());
        let detail = self.finish_detail(table);
        detail.row_count = Some(0);
    }

    /// Marks a table as failed with the captured error message.
    pub fn mark_failed(&mut self, table: &str, error: impl Into<String>) {
        self.failed.push(table.to_string());
        let detail = self.finish_detail(table);
        detail.error = Some(error.into());
    }

    fn finish_detail(&mut self, table: &str) -> &mut TableDetail {
        let now = Utc::now();
        let detail = self
            .details
            .entry(table.to_string())
            .or_insert_with(|| TableDetail {
                start_time: now,
                end_time: None,
                row_count: None,
                error: None,
            });
        detail.end_time = Some(now);
        detail
    }

    /// Stamps the completion time of the run.
    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Outcome recorded for `table`, if it was attempted.
    pub fn outcome(&self, table: &str) -> Option<TableOutcome> {
        let contains = |list: &[String]| list.iter().any(|t| t == table);
        if contains(&self.succeeded) {
            Some(TableOutcome::Succeeded)
        } else if contains(&self.failed) {
            Some(TableOutcome::Failed)
        } else if contains(&self.empty) {
            Some(TableOutcome::Empty)
        } else {
            None
        }
    }

    /// Number of tables attempted.
    pub fn tables_attempted(&self) -> usize {
        self.details.len()
    }

    /// Sum of migrated rows across succeeded tables.
    pub fn total_rows(&self) -> u64 {
        self.details
            .values()
            .filter_map(|d| d.row_count)
            .fold(0u64, u64::saturating_add)
    }

    /// Whether any table failed or the run was cancelled.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || self.cancelled
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
