//! Comment repository implementation.

use sqlx::PgPool;

use threadhub_core::error::{AppError, ErrorKind};
use threadhub_core::result::AppResult;
use threadhub_core::types::{CommentId, PostId};
use threadhub_entity::Comment;

/// Repository for comment rows.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    /// Create a new comment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: CommentId) -> AppResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find comment", e))
    }

    /// Top-level comments of a post, newest first.
    pub async fn find_roots(&self, post_id: PostId, include_deleted: bool) -> AppResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments \
             WHERE post_id = $1 AND parent_id IS NULL AND ($2 OR is_deleted = FALSE) \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(post_id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list top-level comments", e))
    }

    /// Every comment in creation order.
    pub async fn list_all(&self) -> AppResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>("SELECT * FROM comments ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list comments", e))
    }

    /// Set or clear the soft-delete flag.
    pub async fn set_deleted(&self, id: CommentId, deleted: bool) -> AppResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            "UPDATE comments SET is_deleted = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(deleted)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update delete flag", e))
    }

    /// Replace the content of a comment that is not soft-deleted.
    pub async fn update_content(&self, id: CommentId, content: &str) -> AppResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $2, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE RETURNING *",
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update comment", e))
    }
}
