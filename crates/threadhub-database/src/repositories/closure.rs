//! Closure table repository implementation.
//!
//! Every query here is a single indexed lookup: by descendant through the
//! primary key, or by ancestor through `idx_comment_closure_ancestor`.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use threadhub_core::error::{AppError, ErrorKind};
use threadhub_core::result::AppResult;
use threadhub_core::types::CommentId;
use threadhub_entity::{ClosureEdge, Comment, RelatedComment};

/// Repository for closure table reads.
#[derive(Debug, Clone)]
pub struct ClosureRepository {
    pool: PgPool,
}

impl ClosureRepository {
    /// Create a new closure repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Edges whose descendant is `id`.
    pub async fn find_edges(&self, id: CommentId) -> AppResult<Vec<ClosureEdge>> {
        sqlx::query_as::<_, ClosureEdge>(
            "SELECT descendant_id, ancestor_id, depth FROM comment_closure \
             WHERE descendant_id = $1 ORDER BY depth ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load closure edges", e))
    }

    /// Proper ancestors of `id`, nearest first.
    pub async fn find_ancestors(&self, id: CommentId) -> AppResult<Vec<RelatedComment>> {
        sqlx::query_as::<_, RelatedComment>(
            "SELECT c.*, cc.depth FROM comment_closure cc \
             INNER JOIN comments c ON c.id = cc.ancestor_id \
             WHERE cc.descendant_id = $1 AND cc.depth > 0 \
             ORDER BY cc.depth ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ancestors", e))
    }

    /// Proper descendants of `id`, by depth then creation time.
    pub async fn find_descendants(&self, id: CommentId) -> AppResult<Vec<RelatedComment>> {
        sqlx::query_as::<_, RelatedComment>(
            "SELECT c.*, cc.depth FROM comment_closure cc \
             INNER JOIN comments c ON c.id = cc.descendant_id \
             WHERE cc.ancestor_id = $1 AND cc.depth > 0 \
             ORDER BY cc.depth ASC, c.created_at ASC, c.id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find descendants", e))
    }

    /// Direct children of `id` (depth exactly 1) in creation order.
    pub async fn find_children(&self, id: CommentId, include_deleted: bool) -> AppResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(
            "SELECT c.* FROM comment_closure cc \
             INNER JOIN comments c ON c.id = cc.descendant_id \
             WHERE cc.ancestor_id = $1 AND cc.depth = 1 AND ($2 OR c.is_deleted = FALSE) \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list replies", e))
    }

    /// Depth-1 edge counts for a batch of ancestors.
    pub async fn count_children_batch(
        &self,
        ids: &[CommentId],
        include_deleted: bool,
    ) -> AppResult<HashMap<CommentId, u64>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT cc.ancestor_id, COUNT(*) FROM comment_closure cc \
             INNER JOIN comments c ON c.id = cc.descendant_id \
             WHERE cc.ancestor_id = ANY($1) AND cc.depth = 1 AND ($2 OR c.is_deleted = FALSE) \
             GROUP BY cc.ancestor_id",
        )
        .bind(&uuids)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count replies", e))?;

        let mut counts: HashMap<CommentId, u64> = ids.iter().map(|id| (*id, 0)).collect();
        for (ancestor, count) in rows {
            counts.insert(CommentId(ancestor), count as u64);
        }
        Ok(counts)
    }

    /// Total number of edges.
    pub async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment_closure")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count closure edges", e))?;
        Ok(count as u64)
    }
}
