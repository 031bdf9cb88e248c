//! Database migration management commands.

use std::collections::HashSet;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use threadhub_core::error::{AppError, ErrorKind};
use threadhub_database::DatabasePool;
use threadhub_database::migration::{embedded_migrations, run_migrations};

use crate::output::{self, OutputFormat};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show which embedded migrations have been applied
    Status,
}

/// Migration status row
#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    /// Migration version
    version: i64,
    /// Description
    description: String,
    /// Whether it has been applied
    applied: bool,
}

/// Execute migration commands
pub async fn execute(
    args: &MigrateArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let pool = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Status => {
            let applied: HashSet<i64> =
                sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success")
                    .fetch_all(pool.pool())
                    .await
                    .or_else(|e| {
                        // The history table only exists after the first run.
                        let missing_table = matches!(
                            &e,
                            sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01")
                        );
                        if missing_table {
                            Ok(Vec::new())
                        } else {
                            Err(AppError::with_source(
                                ErrorKind::Database,
                                "Failed to read migration history",
                                e,
                            ))
                        }
                    })?
                    .into_iter()
                    .collect();

            let rows: Vec<MigrationRow> = embedded_migrations()
                .into_iter()
                .map(|(version, description)| MigrationRow {
                    applied: applied.contains(&version),
                    version,
                    description,
                })
                .collect();
            output::print_list(&rows, format);
        }
    }

    pool.close().await;
    Ok(())
}
