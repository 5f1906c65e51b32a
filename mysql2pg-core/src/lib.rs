//! Core engine for one-shot MySQL to PostgreSQL migrations.
//!
//! This crate provides the migration engine used by the `mysql2pg` binary:
//! schema translation, value encoding, the table-by-table driver and the
//! post-load sequence fix-up, together with the sqlx-backed adapters.
//!
//! # Guarantees
//! - The source is only ever read, over a read-only session
//! - A failing table never aborts the tables after it
//! - Credentials are never logged and are redacted from error messages
//!
//! # Architecture
//! - [`adapters::SourceCatalog`] and [`adapters::TargetExecutor`] abstract the
//!   two databases; the engine never touches a driver directly
//! - [`typemap::TypeMapper`] and [`encoder::ValueEncoder`] are injected into
//!   [`orchestrator::Migrator`]
//! - [`sequences::SequenceReconciler`] runs once after the table loop

pub mod adapters;
pub mod encoder;
pub mod error;
pub mod logging;
#[cfg(all(feature = "mysql", feature = "postgresql"))]
pub mod migrate;
pub mod models;
pub mod orchestrator;
pub mod sequences;
pub mod typemap;

// Re-export commonly used types
pub use adapters::{
    ConnectionConfig, DatabaseEndpoint, MigrationConfig, MigrationOptions, SourceCatalog,
    TargetExecutor,
};
pub use encoder::{PostgresValueEncoder, ValueEncoder};
pub use error::{MigrationError, Result};
#[cfg(all(feature = "mysql", feature = "postgresql"))]
pub use migrate::{migrate, test_connections};
pub use models::{
    ColumnDescriptor, MigrationStatus, RowRecord, SequenceRestart, SourceValue, TableDetail,
    TableOutcome, TemporalValue,
};
pub use orchestrator::Migrator;
pub use sequences::SequenceReconciler;
pub use typemap::{PostgresTypeMapper, TypeMapper};
