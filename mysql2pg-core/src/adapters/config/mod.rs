//! Configuration types for a migration run.
//!
//! - `ConnectionConfig`: pool settings parsed from a connection URL
//! - `MigrationOptions`: table filter, DDL toggles, batch size
//! - `MigrationConfig`: both endpoints plus options, loadable from JSON
//!
//! # Security
//! `ConnectionConfig` never stores passwords. Passwords that arrive through
//! `MigrationConfig` are held in `Zeroizing` containers and omitted from
//! `Debug` output.

mod connection;
mod migration;

pub use connection::ConnectionConfig;
pub use migration::{DEFAULT_BATCH_SIZE, DatabaseEndpoint, MigrationConfig, MigrationOptions};
