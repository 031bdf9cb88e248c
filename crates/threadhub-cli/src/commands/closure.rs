//! Closure table verification and rebuild commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use threadhub_core::error::AppError;
use threadhub_service::ClosureIssue;

use crate::output::{self, OutputFormat};

/// Arguments for closure commands
#[derive(Debug, Args)]
pub struct ClosureArgs {
    /// Closure subcommand
    #[command(subcommand)]
    pub command: ClosureCommand,
}

/// Closure subcommands
#[derive(Debug, Subcommand)]
pub enum ClosureCommand {
    /// Compare closure edges with parent links
    Verify,
    /// Regenerate every comment's closure edges
    Rebuild {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Issue display row
#[derive(Debug, Serialize, Tabled)]
struct IssueRow {
    /// Issue kind
    issue: &'static str,
    /// Descendant comment
    comment: String,
    /// Ancestor comment
    ancestor: String,
    /// Depth details
    detail: String,
}

impl From<&ClosureIssue> for IssueRow {
    fn from(issue: &ClosureIssue) -> Self {
        match issue {
            ClosureIssue::MissingEdge {
                descendant_id,
                ancestor_id,
                depth,
            } => Self {
                issue: "missing",
                comment: descendant_id.to_string(),
                ancestor: ancestor_id.to_string(),
                detail: format!("depth {depth}"),
            },
            ClosureIssue::WrongDepth {
                descendant_id,
                ancestor_id,
                expected,
                actual,
            } => Self {
                issue: "wrong depth",
                comment: descendant_id.to_string(),
                ancestor: ancestor_id.to_string(),
                detail: format!("expected {expected}, stored {actual}"),
            },
            ClosureIssue::UnexpectedEdge {
                descendant_id,
                ancestor_id,
                depth,
            } => Self {
                issue: "unexpected",
                comment: descendant_id.to_string(),
                ancestor: ancestor_id.to_string(),
                detail: format!("depth {depth}"),
            },
            ClosureIssue::DuplicateEdge {
                descendant_id,
                ancestor_id,
                count,
            } => Self {
                issue: "duplicate",
                comment: descendant_id.to_string(),
                ancestor: ancestor_id.to_string(),
                detail: format!("{count} rows"),
            },
            ClosureIssue::BrokenParentChain { comment_id } => Self {
                issue: "broken chain",
                comment: comment_id.to_string(),
                ancestor: String::new(),
                detail: String::new(),
            },
        }
    }
}

/// Execute closure commands
pub async fn execute(
    args: &ClosureArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::open_engine(config_path).await?;

    match &args.command {
        ClosureCommand::Verify => {
            let report = engine.repair().verify().await?;
            match format {
                OutputFormat::Json => output::print_json(&report),
                OutputFormat::Table => {
                    output::print_kv("Comments checked", &report.comments_checked.to_string());
                    output::print_kv("Edges checked", &report.edges_checked.to_string());
                    if report.is_consistent() {
                        output::print_success("Closure table is consistent.");
                    } else {
                        let rows: Vec<IssueRow> = report.issues.iter().map(IssueRow::from).collect();
                        output::print_list(&rows, format);
                        output::print_warning(&format!(
                            "{} issue(s) found; run `closure rebuild` to repair.",
                            report.issues.len()
                        ));
                    }
                }
            }
        }
        ClosureCommand::Rebuild { force } => {
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt("This will regenerate every closure edge. Continue?")
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    engine.close().await;
                    return Ok(());
                }
            }

            println!("Rebuilding closure table...");
            let report = engine.repair().rebuild().await?;
            match format {
                OutputFormat::Json => output::print_json(&report),
                OutputFormat::Table => {
                    output::print_kv("Comments rebuilt", &report.comments_rebuilt.to_string());
                    output::print_kv("Edges written", &report.edges_written.to_string());
                    if !report.skipped.is_empty() {
                        output::print_warning(&format!(
                            "{} comment(s) with a broken parent chain were skipped.",
                            report.skipped.len()
                        ));
                    }
                    output::print_success("Closure table rebuilt.");
                }
            }
        }
    }

    engine.close().await;
    Ok(())
}
