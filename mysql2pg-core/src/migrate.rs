//! One-call migration entry point owning both database connections.

use crate::Result;
use crate::adapters::MigrationConfig;
use crate::adapters::mysql::MySqlSource;
use crate::adapters::postgres::PostgresTarget;
use crate::models::MigrationStatus;
use crate::orchestrator::Migrator;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Migrates the configured MySQL database into PostgreSQL.
///
/// The configuration is validated before any connection is opened. Both
/// pools are closed on every exit path once they exist, including runs that
/// end in a reconciliation error.
///
/// # Errors
/// - `Configuration` for missing endpoints or invalid options
/// - `Connection` when either server cannot be reached
/// - Any fatal error from [`Migrator::run`]
pub async fn migrate(config: &MigrationConfig, cancel: &CancellationToken) -> Result<MigrationStatus> {
    config.validate()?;

    let source = MySqlSource::connect(&config.resolved_source_url()?).await?;
    let target = match PostgresTarget::connect(&config.resolved_target_url()?).await {
        Ok(target) => target,
        Err(e) => {
            source.close().await;
            return Err(e);
        }
    };

    let result = run_connected(&source, &target, config, cancel).await;

    debug!("Closing source and target connections");
    source.close().await;
    target.close().await;

    result
}

async fn run_connected(
    source: &MySqlSource,
    target: &PostgresTarget,
    config: &MigrationConfig,
    cancel: &CancellationToken,
) -> Result<MigrationStatus> {
    source.test_connection().await?;
    target.test_connection().await?;
    info!("Connected to {} and {}", source.config, target.config);

    Migrator::new()
        .run(source, target, &config.options, cancel)
        .await
}

/// Checks that both configured servers are reachable without migrating.
pub async fn test_connections(config: &MigrationConfig) -> Result<()> {
    config.validate()?;

    let source = MySqlSource::connect(&config.resolved_source_url()?).await?;
    let source_result = source.test_connection().await;
    source.close().await;
    source_result?;

    let target = PostgresTarget::connect(&config.resolved_target_url()?).await?;
    let target_result = target.test_connection().await;
    target.close().await;
    target_result
}
