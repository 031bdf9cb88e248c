//! PostgreSQL repository implementations for comments and closure edges.

pub mod closure;
pub mod comment;
pub mod store;
pub mod transaction;

pub use closure::ClosureRepository;
pub use comment::CommentRepository;
pub use store::PgCommentStore;
pub use transaction::PgStoreTransaction;

use threadhub_core::error::{AppError, ErrorKind};

/// Map a sqlx error from a write, turning known constraint violations into
/// domain errors.
pub(crate) fn map_write_error(e: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("comment_closure_pkey") => {
                return AppError::conflict(format!("{context}: closure edge already exists"));
            }
            Some("comments_pkey") => {
                return AppError::conflict(format!("{context}: comment id already exists"));
            }
            Some("comments_parent_id_fkey") => {
                return AppError::validation(format!("{context}: parent comment does not exist"));
            }
            Some("comment_closure_descendant_id_fkey" | "comment_closure_ancestor_id_fkey") => {
                return AppError::consistency(format!(
                    "{context}: closure edge references a missing comment"
                ));
            }
            _ => {}
        }
    }
    AppError::with_source(ErrorKind::Database, context.to_string(), e)
}
