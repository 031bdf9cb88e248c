//! Storage traits for comments and closure edges.

use std::collections::HashMap;

use async_trait::async_trait;

use threadhub_core::result::AppResult;
use threadhub_core::types::{CommentId, PostId};
use threadhub_entity::{ClosureEdge, Comment, NewComment, RelatedComment};

/// Read access and transactional write access to the comment tree.
///
/// Reads outside a transaction observe committed data only. Writes that
/// touch the closure table go through [`StoreTransaction`] so a comment and
/// its edges become visible together or not at all.
#[async_trait]
pub trait CommentStore: Send + Sync + 'static {
    /// Begin a write transaction.
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>>;

    /// Find a comment by ID.
    async fn find_by_id(&self, id: CommentId) -> AppResult<Option<Comment>>;

    /// Set or clear the soft-delete flag. Returns the updated comment, or
    /// `None` when it does not exist.
    async fn set_deleted(&self, id: CommentId, deleted: bool) -> AppResult<Option<Comment>>;

    /// Replace a comment's content and bump `updated_at`. Returns `None`
    /// when the comment does not exist or is soft-deleted.
    async fn update_content(&self, id: CommentId, content: &str) -> AppResult<Option<Comment>>;

    /// Proper ancestors of `id`, nearest first.
    async fn find_ancestors(&self, id: CommentId) -> AppResult<Vec<RelatedComment>>;

    /// Proper descendants of `id`, by depth then creation time.
    async fn find_descendants(&self, id: CommentId) -> AppResult<Vec<RelatedComment>>;

    /// Direct children of `id` in creation order.
    async fn find_children(&self, id: CommentId, include_deleted: bool)
    -> AppResult<Vec<Comment>>;

    /// Number of direct children for each of `ids`. Ids without children
    /// map to zero.
    async fn count_children(
        &self,
        ids: &[CommentId],
        include_deleted: bool,
    ) -> AppResult<HashMap<CommentId, u64>>;

    /// Top-level comments of a post, newest first.
    async fn find_roots(&self, post_id: PostId, include_deleted: bool) -> AppResult<Vec<Comment>>;

    /// Closure edges whose descendant is `id`.
    async fn find_edges(&self, id: CommentId) -> AppResult<Vec<ClosureEdge>>;

    /// Every comment in creation order. Used by repair tooling.
    async fn list_all(&self) -> AppResult<Vec<Comment>>;

    /// Total number of closure edges.
    async fn count_edges(&self) -> AppResult<u64>;
}

/// A unit of work against the store.
///
/// Dropping a transaction without calling [`StoreTransaction::commit`]
/// discards every write made through it.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Find a comment, including ones inserted earlier in this transaction.
    async fn find_comment(&mut self, id: CommentId) -> AppResult<Option<Comment>>;

    /// Insert a comment row.
    async fn insert_comment(&mut self, new: NewComment) -> AppResult<Comment>;

    /// Closure edges whose descendant is `id`.
    async fn find_edges(&mut self, id: CommentId) -> AppResult<Vec<ClosureEdge>>;

    /// Remove every edge whose descendant is `id`. Returns the count removed.
    async fn delete_edges(&mut self, id: CommentId) -> AppResult<u64>;

    /// Insert closure edges.
    async fn insert_edges(&mut self, edges: &[ClosureEdge]) -> AppResult<()>;

    /// Make every write in this transaction visible.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard every write in this transaction.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
