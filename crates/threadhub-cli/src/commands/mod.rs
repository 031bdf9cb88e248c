//! CLI command definitions and dispatch.

pub mod closure;
pub mod comment;
pub mod migrate;

use clap::{Parser, Subcommand};

use threadhub::Engine;
use threadhub_core::config::AppConfig;
use threadhub_core::error::AppError;

use crate::output::OutputFormat;

/// ThreadHub: threaded comment engine administration
#[derive(Debug, Parser)]
#[command(name = "threadhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Comment commands and tree queries
    Comment(comment::CommentArgs),
    /// Closure table verification and rebuild
    Closure(closure::ClosureArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.config, self.format).await,
            Commands::Comment(args) => comment::execute(args, &self.config, self.format).await,
            Commands::Closure(args) => closure::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: build the engine over the configured store
pub async fn open_engine(config_path: &str) -> Result<Engine, AppError> {
    Engine::new(load_config(config_path)?).await
}
