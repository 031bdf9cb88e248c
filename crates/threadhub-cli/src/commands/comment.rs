//! Comment commands and tree queries.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use threadhub::{CommentView, Engine, QueryOptions, RequestContext, ThreadNode};
use threadhub_core::error::AppError;
use threadhub_core::types::{CommentId, PostId, UserId};

use crate::output::{self, OutputFormat};

/// Arguments for comment commands
#[derive(Debug, Args)]
pub struct CommentArgs {
    /// Comment subcommand
    #[command(subcommand)]
    pub command: CommentCommand,
}

/// Comment subcommands
#[derive(Debug, Subcommand)]
pub enum CommentCommand {
    /// Create a comment or reply
    Create {
        /// Post ID
        #[arg(short, long)]
        post: PostId,
        /// Author user ID
        #[arg(short, long)]
        author: UserId,
        /// Parent comment ID (omit for a top-level comment)
        #[arg(long)]
        parent: Option<CommentId>,
        /// Comment content
        #[arg(short, long)]
        content: String,
    },
    /// Show a single comment
    Show {
        /// Comment ID
        id: CommentId,
        /// Show content of deleted comments
        #[arg(long)]
        include_deleted: bool,
    },
    /// Soft-delete a comment
    Delete {
        /// Comment ID
        id: CommentId,
        /// Acting user ID (must be the author)
        #[arg(short, long)]
        actor: UserId,
    },
    /// Restore a soft-deleted comment
    Restore {
        /// Comment ID
        id: CommentId,
        /// Acting user ID (must be the author)
        #[arg(short, long)]
        actor: UserId,
    },
    /// List direct replies
    Replies {
        /// Comment ID
        id: CommentId,
        /// Include deleted replies
        #[arg(long)]
        include_deleted: bool,
    },
    /// List ancestors, nearest first
    Ancestors {
        /// Comment ID
        id: CommentId,
    },
    /// List descendants by depth
    Descendants {
        /// Comment ID
        id: CommentId,
    },
    /// Show the thread containing a comment
    Thread {
        /// Comment ID
        id: CommentId,
        /// Show content of deleted comments
        #[arg(long)]
        include_deleted: bool,
    },
}

/// Comment display row
#[derive(Debug, Serialize, Tabled)]
struct CommentRow {
    /// Comment ID
    id: String,
    /// Parent ID
    parent: String,
    /// Author ID
    author: String,
    /// Depth relative to the queried comment
    depth: String,
    /// Non-deleted replies
    replies: u64,
    /// Deleted flag
    deleted: bool,
    /// Content preview
    content: String,
    /// Created at
    created_at: String,
}

impl From<&CommentView> for CommentRow {
    fn from(view: &CommentView) -> Self {
        Self {
            id: view.id.to_string(),
            parent: view.parent_id.map(|p| p.to_string()).unwrap_or_default(),
            author: view.author_id.to_string(),
            depth: view.depth.map(|d| d.to_string()).unwrap_or_default(),
            replies: view.replies_count,
            deleted: view.is_deleted,
            content: preview(view),
            created_at: view.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn preview(view: &CommentView) -> String {
    const MAX: usize = 60;
    match &view.content {
        None => "[deleted]".to_string(),
        Some(content) if content.chars().count() > MAX => {
            format!("{}…", content.chars().take(MAX).collect::<String>())
        }
        Some(content) => content.clone(),
    }
}

fn options(include_deleted: bool) -> QueryOptions {
    QueryOptions { include_deleted }
}

/// Execute comment commands
pub async fn execute(
    args: &CommentArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::open_engine(config_path).await?;
    let result = run(&engine, &args.command, format).await;
    engine.close().await;
    result
}

async fn run(engine: &Engine, command: &CommentCommand, format: OutputFormat) -> Result<(), AppError> {
    match command {
        CommentCommand::Create {
            post,
            author,
            parent,
            content,
        } => {
            let ctx = RequestContext::new(*author);
            let view = engine.create_comment(&ctx, *post, *parent, content).await?;
            print_view(&view, format);
        }
        CommentCommand::Show { id, include_deleted } => {
            let view = engine.queries().comment(*id, options(*include_deleted)).await?;
            print_view(&view, format);
        }
        CommentCommand::Delete { id, actor } => {
            engine
                .soft_delete_comment(&RequestContext::new(*actor), *id)
                .await?;
            output::print_success(&format!("Comment {id} deleted."));
        }
        CommentCommand::Restore { id, actor } => {
            engine
                .restore_comment(&RequestContext::new(*actor), *id)
                .await?;
            output::print_success(&format!("Comment {id} restored."));
        }
        CommentCommand::Replies { id, include_deleted } => {
            let views = engine
                .queries()
                .replies_of(*id, options(*include_deleted))
                .await?;
            print_views(&views, format);
        }
        CommentCommand::Ancestors { id } => {
            print_views(&engine.get_ancestors(*id).await?, format);
        }
        CommentCommand::Descendants { id } => {
            print_views(&engine.get_descendants(*id).await?, format);
        }
        CommentCommand::Thread { id, include_deleted } => {
            let thread = engine
                .queries()
                .thread_of(*id, options(*include_deleted))
                .await?;
            match format {
                OutputFormat::Table => print_thread(&thread, 0),
                OutputFormat::Json => output::print_json(&thread),
            }
        }
    }
    Ok(())
}

fn print_view(view: &CommentView, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            output::print_kv("ID", &view.id.to_string());
            output::print_kv("Post", &view.post_id.to_string());
            output::print_kv("Author", &view.author_id.to_string());
            output::print_kv(
                "Parent",
                &view.parent_id.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            );
            output::print_kv("Replies", &view.replies_count.to_string());
            output::print_kv("Deleted", &view.is_deleted.to_string());
            output::print_kv("Created", &view.created_at.to_rfc3339());
            output::print_kv("Updated", &view.updated_at.to_rfc3339());
            output::print_kv("Content", view.content.as_deref().unwrap_or("[deleted]"));
        }
        OutputFormat::Json => output::print_json(view),
    }
}

fn print_views(views: &[CommentView], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<CommentRow> = views.iter().map(CommentRow::from).collect();
            output::print_list(&rows, format);
        }
        OutputFormat::Json => output::print_json(views),
    }
}

fn print_thread(node: &ThreadNode, indent: usize) {
    println!(
        "{:indent$}{} [{}] {}",
        "",
        node.comment.id,
        node.comment.author_id,
        preview(&node.comment),
        indent = indent * 2
    );
    for reply in &node.replies {
        print_thread(reply, indent + 1);
    }
}
