//! [`CommentStore`] over PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use threadhub_core::error::{AppError, ErrorKind};
use threadhub_core::result::AppResult;
use threadhub_core::types::{CommentId, PostId};
use threadhub_entity::{ClosureEdge, Comment, RelatedComment};

use super::{ClosureRepository, CommentRepository, PgStoreTransaction};
use crate::store::{CommentStore, StoreTransaction};

/// Comment store backed by the `comments` and `comment_closure` tables.
#[derive(Debug, Clone)]
pub struct PgCommentStore {
    pool: PgPool,
    comments: CommentRepository,
    closure: ClosureRepository,
}

impl PgCommentStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            comments: CommentRepository::new(pool.clone()),
            closure: ClosureRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgStoreTransaction::new(tx)))
    }

    async fn find_by_id(&self, id: CommentId) -> AppResult<Option<Comment>> {
        self.comments.find_by_id(id).await
    }

    async fn set_deleted(&self, id: CommentId, deleted: bool) -> AppResult<Option<Comment>> {
        self.comments.set_deleted(id, deleted).await
    }

    async fn update_content(&self, id: CommentId, content: &str) -> AppResult<Option<Comment>> {
        self.comments.update_content(id, content).await
    }

    async fn find_ancestors(&self, id: CommentId) -> AppResult<Vec<RelatedComment>> {
        self.closure.find_ancestors(id).await
    }

    async fn find_descendants(&self, id: CommentId) -> AppResult<Vec<RelatedComment>> {
        self.closure.find_descendants(id).await
    }

    async fn find_children(
        &self,
        id: CommentId,
        include_deleted: bool,
    ) -> AppResult<Vec<Comment>> {
        self.closure.find_children(id, include_deleted).await
    }

    async fn count_children(
        &self,
        ids: &[CommentId],
        include_deleted: bool,
    ) -> AppResult<HashMap<CommentId, u64>> {
        self.closure.count_children_batch(ids, include_deleted).await
    }

    async fn find_roots(&self, post_id: PostId, include_deleted: bool) -> AppResult<Vec<Comment>> {
        self.comments.find_roots(post_id, include_deleted).await
    }

    async fn find_edges(&self, id: CommentId) -> AppResult<Vec<ClosureEdge>> {
        self.closure.find_edges(id).await
    }

    async fn list_all(&self) -> AppResult<Vec<Comment>> {
        self.comments.list_all().await
    }

    async fn count_edges(&self) -> AppResult<u64> {
        self.closure.count().await
    }
}
