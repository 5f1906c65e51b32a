//! Migration driver tests against in-memory source and target.
//!
//! This test suite covers:
//! - Batching of INSERT statements
//! - Empty tables
//! - Per-table failure isolation
//! - Table filters and option validation
//! - Cancellation
//! - Hand-off to sequence reconciliation

mod common;

use async_trait::async_trait;
use common::{FakeSequence, FakeSource, FakeTable, FakeTarget, tuple_count};
use mysql2pg_core::Result;
use mysql2pg_core::adapters::{MigrationOptions, TargetExecutor};
use mysql2pg_core::error::MigrationError;
use mysql2pg_core::models::{ColumnDescriptor, RowRecord, TableOutcome};
use mysql2pg_core::orchestrator::Migrator;
use mysql2pg_core::typemap::TypeMapper;
use tokio_util::sync::CancellationToken;

fn no_sequences() -> MigrationOptions {
    MigrationOptions::default().with_reset_sequences(false)
}

#[tokio::test]
async fn test_batches_split_by_batch_size() {
    let source = FakeSource::new(vec![FakeTable::new("users").with_rows(5)]);
    let target = FakeTarget::new();
    let options = no_sequences().with_batch_size(2);

    let status = Migrator::new()
        .run(&source, &target, &options, &CancellationToken::new())
        .await
        .expect("run succeeds");

    let inserts = target.inserts_for("users");
    let sizes: Vec<usize> = inserts.iter().map(|s| tuple_count(s)).collect();
    assert_eq!(sizes, vec![2, 2, 1]);

    assert_eq!(status.succeeded, vec!["users"]);
    assert_eq!(status.details["users"].row_count, Some(5));
    assert_eq!(status.outcome("users"), Some(TableOutcome::Succeeded));
}

#[tokio::test]
async fn test_table_is_recreated_before_rows_are_copied() {
    let source = FakeSource::new(vec![FakeTable::new("users").with_rows(1)]);
    let target = FakeTarget::new();

    Migrator::new()
        .run(&source, &target, &no_sequences(), &CancellationToken::new())
        .await
        .expect("run succeeds");

    let statements = target.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0], "DROP TABLE IF EXISTS \"users\" CASCADE");
    assert_eq!(
        statements[1],
        "CREATE TABLE \"users\" (\"id\" SERIAL PRIMARY KEY NOT NULL, \"name\" VARCHAR(100) NOT NULL)"
    );
    assert_eq!(
        statements[2],
        "INSERT INTO \"users\" (\"id\", \"name\") VALUES ('1', 'row 1')"
    );
}

#[tokio::test]
async fn test_empty_table_reported_only_as_empty() {
    let source = FakeSource::new(vec![FakeTable::new("logs")]);
    let target = FakeTarget::new();

    let status = Migrator::new()
        .run(&source, &target, &no_sequences(), &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(status.empty, vec!["logs"]);
    assert!(status.succeeded.is_empty());
    assert!(status.failed.is_empty());
    assert_eq!(status.details["logs"].row_count, Some(0));
    assert!(target.inserts_for("logs").is_empty());
    assert_eq!(target.executed("CREATE TABLE \"logs\"").len(), 1);
}

#[tokio::test]
async fn test_describe_failure_is_isolated() {
    let source = FakeSource::new(vec![
        FakeTable::new("a").with_rows(2),
        FakeTable::new("b").with_rows(2).failing_describe(),
        FakeTable::new("c").with_rows(3),
    ]);
    let target = FakeTarget::new();

    let status = Migrator::new()
        .run(&source, &target, &no_sequences(), &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(status.succeeded, vec!["a", "c"]);
    assert_eq!(status.failed, vec!["b"]);
    assert_eq!(status.details["a"].row_count, Some(2));
    assert_eq!(status.details["c"].row_count, Some(3));

    let error = status.details["b"].error.as_deref().expect("error recorded");
    assert!(error.contains("cannot describe b"), "{}", error);
    assert!(target.executed("DROP TABLE IF EXISTS \"b\"").is_empty());
}

#[tokio::test]
async fn test_target_ddl_failure_is_isolated() {
    let source = FakeSource::new(vec![
        FakeTable::new("a").with_rows(1),
        FakeTable::new("b").with_rows(1),
        FakeTable::new("c").with_rows(1),
    ]);
    let target = FakeTarget::new().failing_on("CREATE TABLE \"b\"");

    let status = Migrator::new()
        .run(&source, &target, &no_sequences(), &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(status.succeeded, vec!["a", "c"]);
    assert_eq!(status.failed, vec!["b"]);
    assert!(target.inserts_for("b").is_empty());
    assert_eq!(status.tables_attempted(), 3);
}

#[tokio::test]
async fn test_row_stream_failure_marks_table_failed() {
    let source = FakeSource::new(vec![
        FakeTable::new("a").with_rows(5).failing_after(3),
        FakeTable::new("b").with_rows(1),
    ]);
    let target = FakeTarget::new();
    let options = no_sequences().with_batch_size(2);

    let status = Migrator::new()
        .run(&source, &target, &options, &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(status.failed, vec!["a"]);
    assert_eq!(status.succeeded, vec!["b"]);
    assert!(
        status.details["a"]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("connection lost"))
    );
    // The first full batch was already written before the stream failed
    assert_eq!(target.inserts_for("a").len(), 1);
}

#[tokio::test]
async fn test_repeated_runs_give_identical_outcomes() {
    let source = FakeSource::new(vec![
        FakeTable::new("a").with_rows(4),
        FakeTable::new("b").failing_describe(),
        FakeTable::new("c"),
    ]);
    let target = FakeTarget::new();
    let options = no_sequences().with_batch_size(3);
    let migrator = Migrator::new();

    let first = migrator
        .run(&source, &target, &options, &CancellationToken::new())
        .await
        .expect("first run");
    let first_statements = target.statements();
    target.clear();

    let second = migrator
        .run(&source, &target, &options, &CancellationToken::new())
        .await
        .expect("second run");

    assert_eq!(first.succeeded, second.succeeded);
    assert_eq!(first.failed, second.failed);
    assert_eq!(first.empty, second.empty);
    for table in ["a", "b", "c"] {
        assert_eq!(first.details[table].row_count, second.details[table].row_count);
    }
    assert_eq!(first_statements, target.statements());
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_table_filter_keeps_source_order() {
    let source = FakeSource::new(vec![
        FakeTable::new("a").with_rows(1),
        FakeTable::new("b").with_rows(1),
        FakeTable::new("c").with_rows(1),
    ]);
    let target = FakeTarget::new();
    let options = no_sequences().with_tables(["c", "a", "missing"]);

    let status = Migrator::new()
        .run(&source, &target, &options, &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(status.succeeded, vec!["a", "c"]);
    assert!(status.outcome("b").is_none());
    assert!(target.executed("DROP TABLE IF EXISTS \"b\"").is_empty());
}

#[tokio::test]
async fn test_filter_matching_nothing_yields_empty_status() {
    let source = FakeSource::new(vec![FakeTable::new("a").with_rows(1)]);
    let target = FakeTarget::new();
    let options = MigrationOptions::default().with_tables(["nope"]);

    let status = Migrator::new()
        .run(&source, &target, &options, &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(status.tables_attempted(), 0);
    assert!(status.succeeded.is_empty());
    assert!(status.failed.is_empty());
    assert!(status.empty.is_empty());
    assert!(target.executed("DROP").is_empty());
    assert!(status.completed_at.is_some());
}

#[tokio::test]
async fn test_zero_batch_size_rejected_before_any_work() {
    let source = FakeSource::new(vec![FakeTable::new("a").with_rows(1)]);
    let target = FakeTarget::new();
    let options = MigrationOptions::default().with_batch_size(0);

    let result = Migrator::new()
        .run(&source, &target, &options, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(MigrationError::Configuration { .. })));
    assert!(target.statements().is_empty());
}

#[tokio::test]
async fn test_disabled_constraints_are_not_emitted() {
    let source = FakeSource::new(vec![FakeTable::new("users").with_columns(vec![
        ColumnDescriptor::new("id", "bigint(20)")
            .auto_increment()
            .primary_key()
            .not_null(),
        ColumnDescriptor::new("status", "varchar(10)")
            .not_null()
            .with_default("new"),
    ])]);
    let target = FakeTarget::new();
    let mut options = no_sequences();
    options.primary = false;
    options.not_null = false;
    options.default_values = false;

    Migrator::new()
        .run(&source, &target, &options, &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(
        target.executed("CREATE TABLE"),
        vec!["CREATE TABLE \"users\" (\"id\" BIGSERIAL, \"status\" VARCHAR(10))"]
    );
}

#[tokio::test]
async fn test_cancel_before_start_skips_everything() {
    let source = FakeSource::new(vec![FakeTable::new("a").with_rows(1)]);
    let target = FakeTarget::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let status = Migrator::new()
        .run(&source, &target, &MigrationOptions::default(), &cancel)
        .await
        .expect("run returns status");

    assert!(status.cancelled);
    assert!(status.has_failures());
    assert_eq!(status.tables_attempted(), 0);
    assert!(target.statements().is_empty());
}

/// Target that cancels the run as soon as the first INSERT lands.
struct CancellingTarget {
    inner: FakeTarget,
    cancel: CancellationToken,
}

#[async_trait]
impl TargetExecutor for CancellingTarget {
    async fn execute(&self, statement: &str) -> Result<u64> {
        let affected = self.inner.execute(statement).await?;
        if statement.starts_with("INSERT") {
            self.cancel.cancel();
        }
        Ok(affected)
    }

    async fn query(&self, statement: &str) -> Result<Vec<RowRecord>> {
        self.inner.query(statement).await
    }
}

#[tokio::test]
async fn test_cancel_mid_table_fails_table_and_stops() {
    let source = FakeSource::new(vec![
        FakeTable::new("a").with_rows(3),
        FakeTable::new("b").with_rows(1),
    ]);
    let cancel = CancellationToken::new();
    let target = CancellingTarget {
        inner: FakeTarget::new().with_sequence(FakeSequence::new("a", 3)),
        cancel: cancel.clone(),
    };
    let options = MigrationOptions::default().with_batch_size(1);

    let status = Migrator::new()
        .run(&source, &target, &options, &cancel)
        .await
        .expect("run returns status");

    assert!(status.cancelled);
    assert_eq!(status.failed, vec!["a"]);
    assert!(
        status.details["a"]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("cancelled"))
    );
    assert!(status.outcome("b").is_none());
    assert_eq!(target.inner.inserts_for("a").len(), 1);
    assert!(status.sequences_reset.is_empty());
    assert!(target.inner.executed("ALTER SEQUENCE").is_empty());
}

#[tokio::test]
async fn test_sequences_reset_after_table_loop() {
    let source = FakeSource::new(vec![FakeTable::new("users").with_rows(42)]);
    let target = FakeTarget::new().with_sequence(FakeSequence::new("users", 42));

    let status = Migrator::new()
        .run(
            &source,
            &target,
            &MigrationOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("run succeeds");

    assert_eq!(status.sequences_reset.len(), 1);
    assert_eq!(status.sequences_reset[0].restart_with, 43);

    let statements = target.statements();
    let last = statements.last().expect("statements issued");
    assert_eq!(
        last,
        "ALTER SEQUENCE \"public\".\"users_id_seq\" RESTART WITH 43"
    );
}

#[tokio::test]
async fn test_reconciliation_failure_is_fatal() {
    let source = FakeSource::new(vec![FakeTable::new("users").with_rows(2)]);
    let target = FakeTarget::new()
        .with_sequence(FakeSequence::new("users", 2))
        .failing_on("ALTER SEQUENCE");

    let result = Migrator::new()
        .run(
            &source,
            &target,
            &MigrationOptions::default(),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(MigrationError::Reconciliation { .. })));
    // Table work happened before reconciliation
    assert_eq!(target.inserts_for("users").len(), 1);
}

/// Mapper that turns every column into TEXT.
struct TextOnlyMapper;

impl TypeMapper for TextOnlyMapper {
    fn map(&self, _column: &ColumnDescriptor) -> String {
        "TEXT".to_string()
    }
}

#[tokio::test]
async fn test_injected_type_mapper_is_used() {
    let source = FakeSource::new(vec![FakeTable::new("users")]);
    let target = FakeTarget::new();

    Migrator::new()
        .with_type_mapper(TextOnlyMapper)
        .run(&source, &target, &no_sequences(), &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(
        target.executed("CREATE TABLE"),
        vec!["CREATE TABLE \"users\" (\"id\" TEXT NOT NULL, \"name\" TEXT NOT NULL)"]
    );
}
