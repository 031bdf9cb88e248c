//! PostgreSQL-backed store transaction.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use threadhub_core::error::{AppError, ErrorKind};
use threadhub_core::result::AppResult;
use threadhub_core::types::CommentId;
use threadhub_entity::{ClosureEdge, Comment, NewComment};

use super::map_write_error;
use crate::store::StoreTransaction;

/// A store transaction wrapping a sqlx transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgStoreTransaction {
    /// Wrap an open sqlx transaction.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn find_comment(&mut self, id: CommentId) -> AppResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find comment", e))
    }

    async fn insert_comment(&mut self, new: NewComment) -> AppResult<Comment> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, post_id, author_id, parent_id, content, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, clock_timestamp(), clock_timestamp()) RETURNING *",
        )
        .bind(CommentId::new())
        .bind(new.post_id)
        .bind(new.author_id)
        .bind(new.parent_id)
        .bind(&new.content)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to insert comment"))
    }

    async fn find_edges(&mut self, id: CommentId) -> AppResult<Vec<ClosureEdge>> {
        sqlx::query_as::<_, ClosureEdge>(
            "SELECT descendant_id, ancestor_id, depth FROM comment_closure \
             WHERE descendant_id = $1 ORDER BY depth ASC",
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load closure edges", e))
    }

    async fn delete_edges(&mut self, id: CommentId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM comment_closure WHERE descendant_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear closure edges", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn insert_edges(&mut self, edges: &[ClosureEdge]) -> AppResult<()> {
        if edges.is_empty() {
            return Ok(());
        }

        let descendants: Vec<Uuid> = edges.iter().map(|e| e.descendant_id.0).collect();
        let ancestors: Vec<Uuid> = edges.iter().map(|e| e.ancestor_id.0).collect();
        let depths = edges
            .iter()
            .map(|e| i32::try_from(e.depth))
            .collect::<Result<Vec<i32>, _>>()
            .map_err(|e| AppError::with_source(ErrorKind::Consistency, "Closure depth overflow", e))?;

        sqlx::query(
            "INSERT INTO comment_closure (descendant_id, ancestor_id, depth) \
             SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::int4[])",
        )
        .bind(&descendants)
        .bind(&ancestors)
        .bind(&depths)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to insert closure edges"))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to roll back", e))
    }
}
