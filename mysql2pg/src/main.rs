//! MySQL to PostgreSQL migration tool.
//!
//! Copies every table of a MySQL database (schema and rows) into a
//! PostgreSQL database, then restarts the target's sequences past the
//! copied keys.
//!
//! # Guarantees
//! - The source is only read, over a read-only session
//! - Credentials are never logged
//! - A failing table is reported without stopping the run

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use mysql2pg_core::error::redact_database_url;
use mysql2pg_core::logging::init_logging;
use mysql2pg_core::{MigrationConfig, MigrationOptions, MigrationStatus, TableOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "mysql2pg")]
#[command(about = "One-shot MySQL to PostgreSQL migration")]
#[command(version)]
#[command(long_about = "
mysql2pg - Copy a MySQL database into PostgreSQL

Every selected table is dropped and recreated on the target, its rows are
copied in batches, and table-owned sequences are restarted past the highest
copied key. A failing table is recorded and the run continues.

EXAMPLES:
  mysql2pg --source-url mysql://root:pw@localhost/shop --target-url postgres://postgres@localhost/shop
  mysql2pg --config migration.json --tables users,orders --report run.json
  MYSQL_URL=... POSTGRES_URL=... mysql2pg test
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub migration: MigrationArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Migrate tables from MySQL into PostgreSQL (default)
    Migrate,
    /// Test both database connections without migrating
    Test,
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// Source MySQL connection URL
    #[arg(
        long,
        env = "MYSQL_URL",
        global = true,
        help = "Source MySQL connection string (credentials will be sanitized in logs)"
    )]
    pub source_url: Option<String>,

    /// Target PostgreSQL connection URL
    #[arg(
        long,
        env = "POSTGRES_URL",
        global = true,
        help = "Target PostgreSQL connection string (credentials will be sanitized in logs)"
    )]
    pub target_url: Option<String>,

    /// JSON configuration file
    #[arg(
        long,
        global = true,
        help = "JSON file with mysql, postgres and options sections"
    )]
    pub config: Option<PathBuf>,

    /// Prompt for database passwords
    #[arg(
        long,
        global = true,
        help = "Prompt for the source and target passwords instead of embedding them in URLs"
    )]
    pub prompt_passwords: bool,
}

#[derive(Args)]
pub struct MigrationArgs {
    /// Tables to migrate
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated list of tables to migrate (default: all)"
    )]
    pub tables: Vec<String>,

    /// Rows per INSERT statement
    #[arg(long, help = "Maximum rows per INSERT statement (default: 1000)")]
    pub batch_size: Option<usize>,

    /// Skip PRIMARY KEY on auto-increment columns
    #[arg(long, help = "Do not declare primary keys on the target")]
    pub no_primary: bool,

    /// Skip NOT NULL constraints
    #[arg(long, help = "Do not copy NOT NULL constraints")]
    pub no_not_null: bool,

    /// Skip column defaults
    #[arg(long, help = "Do not copy column defaults")]
    pub no_default: bool,

    /// Skip sequence reconciliation
    #[arg(long, help = "Do not restart sequences after the load")]
    pub no_reset_sequences: bool,

    /// JSON run report
    #[arg(long, help = "Write the run status as JSON to this path")]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress all output except errors"
    )]
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let config = build_config(&cli)?;

    match cli.command.as_ref().unwrap_or(&Command::Migrate) {
        Command::Test => test_connections(&config).await,
        Command::Migrate => run_migration(&config, cli.migration.report.as_ref()).await,
    }
}

/// Merges the config file, connection flags and migration flags.
///
/// Flags override the file; URLs override the file's endpoint sections.
fn build_config(cli: &Cli) -> anyhow::Result<MigrationConfig> {
    let mut config = match &cli.connection.config {
        Some(path) => MigrationConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => MigrationConfig::default(),
    };

    if let Some(url) = &cli.connection.source_url {
        config = config.with_source_url(url.as_str());
    }
    if let Some(url) = &cli.connection.target_url {
        config = config.with_target_url(url.as_str());
    }

    if cli.connection.prompt_passwords {
        let source = config.resolved_source_url()?;
        config = config.with_source_url(prompt_password_into(&source, "MySQL")?);
        let target = config.resolved_target_url()?;
        config = config.with_target_url(prompt_password_into(&target, "PostgreSQL")?);
    }

    let options = apply_migration_args(config.options.clone(), &cli.migration);
    config = config.with_options(options);

    config.validate()?;
    Ok(config)
}

/// Applies command-line overrides to `options`.
fn apply_migration_args(mut options: MigrationOptions, args: &MigrationArgs) -> MigrationOptions {
    if !args.tables.is_empty() {
        options.tables = args.tables.clone();
    }
    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size;
    }
    if args.no_primary {
        options.primary = false;
    }
    if args.no_not_null {
        options.not_null = false;
    }
    if args.no_default {
        options.default_values = false;
    }
    if args.no_reset_sequences {
        options.reset_sequences = false;
    }
    options
}

/// Reads a password from the terminal and places it in `url`.
fn prompt_password_into(url: &str, label: &str) -> anyhow::Result<String> {
    let mut parsed = url::Url::parse(url)
        .with_context(|| format!("Invalid {} URL: {}", label, redact_database_url(url)))?;

    let password = rpassword::prompt_password(format!("{} password: ", label))
        .context("Failed to read password")?;
    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    if parsed.set_password(Some(&password)).is_err() {
        bail!("{} URL cannot carry a password", label);
    }
    Ok(parsed.into())
}

/// Tests both connections without migrating
async fn test_connections(config: &MigrationConfig) -> anyhow::Result<ExitCode> {
    info!("Testing database connections...");

    mysql2pg_core::test_connections(config).await.map_err(|e| {
        error!("Connection test failed: {}", e.detailed_message());
        e
    })?;

    info!("✓ Connection test successful");
    println!("Source and target connections successful");
    Ok(ExitCode::SUCCESS)
}

/// Runs the migration, prints a summary and optionally writes the report
async fn run_migration(
    config: &MigrationConfig,
    report: Option<&PathBuf>,
) -> anyhow::Result<ExitCode> {
    info!("Source: {}", redact_database_url(&config.resolved_source_url()?));
    info!("Target: {}", redact_database_url(&config.resolved_target_url()?));

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current statement");
            signal_token.cancel();
        }
    });

    let status = mysql2pg_core::migrate(config, &cancel).await.map_err(|e| {
        error!("Migration failed: {}", e.detailed_message());
        e
    })?;

    if let Some(path) = report {
        save_report(&status, path).await?;
        info!("✓ Report saved to {}", path.display());
    }

    print_summary(&status);

    if status.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

async fn save_report(status: &MigrationStatus, path: &PathBuf) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(status).context("Failed to serialize report")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn print_summary(status: &MigrationStatus) {
    println!("{}", summary_text(status));
}

fn summary_text(status: &MigrationStatus) -> String {
    let mut lines = vec![format!(
        "Migrated {} of {} tables ({} rows)",
        status.succeeded.len() + status.empty.len(),
        status.tables_attempted(),
        status.total_rows()
    )];

    for (table, detail) in &status.details {
        let Some(outcome) = status.outcome(table) else {
            continue;
        };
        let line = match outcome {
            TableOutcome::Succeeded => format!(
                "  {}: {} ({} rows)",
                table,
                outcome,
                detail.row_count.unwrap_or_default()
            ),
            TableOutcome::Empty => format!("  {}: {}", table, outcome),
            TableOutcome::Failed => format!(
                "  {}: {} ({})",
                table,
                outcome,
                detail.error.as_deref().unwrap_or("unknown error")
            ),
        };
        lines.push(line);
    }

    if !status.sequences_reset.is_empty() {
        lines.push(format!("Sequences reset: {}", status.sequences_reset.len()));
    }
    if status.cancelled {
        lines.push("Cancelled before all tables were migrated".to_string());
    }

    lines.join("\n")
}
