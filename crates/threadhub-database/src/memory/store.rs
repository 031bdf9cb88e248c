//! [`CommentStore`] held in process memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use threadhub_core::result::AppResult;
use threadhub_core::types::{CommentId, PostId};
use threadhub_entity::{ClosureEdge, Comment, RelatedComment};

use super::state::MemoryState;
use super::transaction::MemoryTransaction;
use crate::store::{CommentStore, StoreTransaction};

/// In-memory comment store.
///
/// Transactions stage their writes privately and apply them under one
/// write lock at commit, so readers never see a comment without its
/// closure edges.
#[derive(Debug, Clone, Default)]
pub struct MemoryCommentStore {
    state: Arc<RwLock<MemoryState>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryCommentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored comments.
    pub async fn len(&self) -> usize {
        self.state.read().await.comments.len()
    }

    /// Whether the store holds no comments.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Insert closure edges directly, bypassing the maintenance algorithm.
    /// Only repair tests need this, to simulate a damaged closure table.
    #[doc(hidden)]
    pub async fn inject_edges(&self, edges: &[ClosureEdge]) {
        let mut state = self.state.write().await;
        for edge in edges {
            state.insert_edge(*edge);
        }
    }

    /// Drop every edge of `id` directly. Counterpart of [`Self::inject_edges`].
    #[doc(hidden)]
    pub async fn strip_edges(&self, id: CommentId) -> usize {
        self.state.write().await.remove_edges_of(id)
    }

    /// Apply `apply` to the comment when `guard` accepts it, under one
    /// write lock.
    async fn modify(
        &self,
        id: CommentId,
        guard: impl FnOnce(&Comment) -> bool + Send,
        apply: impl FnOnce(&mut Comment) + Send,
    ) -> AppResult<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state
            .comments
            .get_mut(&id)
            .filter(|stored| guard(&stored.comment))
            .map(|stored| {
                apply(&mut stored.comment);
                stored.comment.updated_at = Utc::now();
                stored.comment.clone()
            }))
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction::new(
            Arc::clone(&self.state),
            Arc::clone(&self.sequence),
        )))
    }

    async fn find_by_id(&self, id: CommentId) -> AppResult<Option<Comment>> {
        Ok(self.state.read().await.comment(id).cloned())
    }

    async fn set_deleted(&self, id: CommentId, deleted: bool) -> AppResult<Option<Comment>> {
        self.modify(id, |_| true, |comment| comment.is_deleted = deleted)
            .await
    }

    async fn update_content(&self, id: CommentId, content: &str) -> AppResult<Option<Comment>> {
        let content = content.to_string();
        self.modify(
            id,
            |comment| !comment.is_deleted,
            move |comment| comment.content = content,
        )
        .await
    }

    async fn find_ancestors(&self, id: CommentId) -> AppResult<Vec<RelatedComment>> {
        Ok(self.state.read().await.ancestors(id))
    }

    async fn find_descendants(&self, id: CommentId) -> AppResult<Vec<RelatedComment>> {
        Ok(self
            .state
            .read()
            .await
            .descendants(id, |edge, _| edge.depth > 0))
    }

    async fn find_children(
        &self,
        id: CommentId,
        include_deleted: bool,
    ) -> AppResult<Vec<Comment>> {
        Ok(self
            .state
            .read()
            .await
            .descendants(id, |edge, comment| {
                edge.depth == 1 && (include_deleted || !comment.is_deleted)
            })
            .into_iter()
            .map(|related| related.comment)
            .collect())
    }

    async fn count_children(
        &self,
        ids: &[CommentId],
        include_deleted: bool,
    ) -> AppResult<HashMap<CommentId, u64>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .map(|id| {
                let count = state
                    .by_ancestor
                    .get(id)
                    .map(|edges| {
                        edges
                            .iter()
                            .filter(|edge| edge.depth == 1)
                            .filter_map(|edge| state.comment(edge.descendant_id))
                            .filter(|comment| include_deleted || !comment.is_deleted)
                            .count()
                    })
                    .unwrap_or(0);
                (*id, count as u64)
            })
            .collect())
    }

    async fn find_roots(&self, post_id: PostId, include_deleted: bool) -> AppResult<Vec<Comment>> {
        let state = self.state.read().await;
        let mut roots: Vec<_> = state
            .comments
            .values()
            .filter(|stored| {
                let c = &stored.comment;
                c.post_id == post_id && c.is_root() && (include_deleted || !c.is_deleted)
            })
            .collect();
        roots.sort_by(|a, b| {
            b.comment
                .created_at
                .cmp(&a.comment.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(roots.into_iter().map(|stored| stored.comment.clone()).collect())
    }

    async fn find_edges(&self, id: CommentId) -> AppResult<Vec<ClosureEdge>> {
        let mut edges = self.state.read().await.edges_of(id).to_vec();
        edges.sort_by_key(|edge| edge.depth);
        Ok(edges)
    }

    async fn list_all(&self) -> AppResult<Vec<Comment>> {
        let state = self.state.read().await;
        let mut all: Vec<_> = state.comments.values().collect();
        all.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        Ok(all.into_iter().map(|stored| stored.comment.clone()).collect())
    }

    async fn count_edges(&self) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state.by_descendant.values().map(Vec::len).sum::<usize>() as u64)
    }
}
