//! In-memory source and target used by the engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use mysql2pg_core::Result;
use mysql2pg_core::adapters::{SourceCatalog, TargetExecutor};
use mysql2pg_core::error::MigrationError;
use mysql2pg_core::models::{ColumnDescriptor, RowRecord, SourceValue};
use std::sync::Mutex;

/// One table served by [`FakeSource`].
#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<RowRecord>,
    pub describe_error: bool,
    pub fail_after_rows: Option<usize>,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: vec![
                ColumnDescriptor::new("id", "int(11)")
                    .auto_increment()
                    .primary_key()
                    .not_null(),
                ColumnDescriptor::new("name", "varchar(100)").not_null(),
            ],
            ..Default::default()
        }
    }

    /// Adds `count` rows shaped like the default columns.
    pub fn with_rows(mut self, count: usize) -> Self {
        self.rows = (1..=count)
            .map(|i| {
                RowRecord::new()
                    .with("id", i as i64)
                    .with("name", format!("row {}", i))
            })
            .collect();
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = columns;
        self
    }

    pub fn failing_describe(mut self) -> Self {
        self.describe_error = true;
        self
    }

    /// Makes the row stream fail once `rows` rows have been produced.
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after_rows = Some(rows);
        self
    }
}

/// Source catalog backed by a list of [`FakeTable`]s.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    pub tables: Vec<FakeTable>,
}

impl FakeSource {
    pub fn new(tables: Vec<FakeTable>) -> Self {
        Self { tables }
    }

    fn table(&self, name: &str) -> Result<&FakeTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| MigrationError::query_failed(format!("no such table {}", name)))
    }
}

#[async_trait]
impl SourceCatalog for FakeSource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let fake = self.table(table)?;
        if fake.describe_error {
            return Err(MigrationError::query_failed(format!(
                "cannot describe {}",
                table
            )));
        }
        Ok(fake.columns.clone())
    }

    fn read_rows<'a>(&'a self, table: &'a str) -> BoxStream<'a, Result<RowRecord>> {
        let fake = match self.table(table) {
            Ok(fake) => fake,
            Err(e) => return stream::iter(vec![Err(e)]).boxed(),
        };
        let fail_after = fake.fail_after_rows;
        stream::iter(fake.rows.iter().enumerate().map(move |(i, row)| {
            match fail_after {
                Some(limit) if i >= limit => Err(MigrationError::query_failed("connection lost")),
                _ => Ok(row.clone()),
            }
        }))
        .boxed()
    }
}

/// A table-owned sequence the fake target reports during reconciliation.
#[derive(Debug, Clone)]
pub struct FakeSequence {
    pub sequence: String,
    pub table: String,
    pub primary_key: Option<String>,
    pub max_key: i64,
}

impl FakeSequence {
    pub fn new(table: &str, max_key: i64) -> Self {
        Self {
            sequence: format!("{}_id_seq", table),
            table: table.to_string(),
            primary_key: Some("id".to_string()),
            max_key,
        }
    }

    pub fn without_primary_key(mut self) -> Self {
        self.primary_key = None;
        self
    }
}

/// Target executor that records every statement.
///
/// Statements containing any `fail_on` fragment are rejected. Catalog queries
/// issued by the sequence reconciler are answered from `sequences`.
#[derive(Debug, Default)]
pub struct FakeTarget {
    statements: Mutex<Vec<String>>,
    pub fail_on: Vec<String>,
    pub sequences: Vec<FakeSequence>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    pub fn with_sequence(mut self, sequence: FakeSequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.statements.lock().unwrap().clear();
    }

    /// INSERT statements issued for `table`, in order.
    pub fn inserts_for(&self, table: &str) -> Vec<String> {
        let prefix = format!("INSERT INTO \"{}\" ", table);
        self.statements()
            .into_iter()
            .filter(|s| s.starts_with(&prefix))
            .collect()
    }

    pub fn executed(&self, prefix: &str) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|s| s.starts_with(prefix))
            .collect()
    }

    fn record(&self, statement: &str) -> Result<()> {
        self.statements.lock().unwrap().push(statement.to_string());
        match self.fail_on.iter().find(|f| statement.contains(f.as_str())) {
            Some(fragment) => Err(MigrationError::query_failed(format!(
                "rejected statement containing {}",
                fragment
            ))),
            None => Ok(()),
        }
    }

    fn sequence_for_table(&self, statement: &str) -> Option<&FakeSequence> {
        self.sequences
            .iter()
            .find(|s| statement.contains(&format!("\"public\".\"{}\"", s.table)))
    }
}

#[async_trait]
impl TargetExecutor for FakeTarget {
    async fn execute(&self, statement: &str) -> Result<u64> {
        self.record(statement)?;
        Ok(0)
    }

    async fn query(&self, statement: &str) -> Result<Vec<RowRecord>> {
        self.record(statement)?;

        if statement.contains("pg_depend") {
            return Ok(self
                .sequences
                .iter()
                .map(|s| {
                    RowRecord::new()
                        .with("sequence_schema", "public")
                        .with("sequence_name", s.sequence.as_str())
                        .with("table_schema", "public")
                        .with("table_name", s.table.as_str())
                })
                .collect());
        }

        if statement.contains("pg_index") {
            return Ok(self
                .sequence_for_table(statement)
                .and_then(|s| s.primary_key.clone())
                .map(|pk| vec![RowRecord::new().with("column_name", pk)])
                .unwrap_or_default());
        }

        if statement.contains("MAX(") {
            return Ok(self
                .sequence_for_table(statement)
                .map(|s| vec![RowRecord::new().with("max_value", s.max_key)])
                .unwrap_or_default());
        }

        Ok(Vec::new())
    }
}

/// Number of row tuples in a multi-row INSERT.
pub fn tuple_count(insert: &str) -> usize {
    insert.matches("), (").count() + 1
}

/// Text cell shorthand.
pub fn text(value: &str) -> SourceValue {
    SourceValue::Text(value.to_string())
}
