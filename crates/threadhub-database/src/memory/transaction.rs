//! Staged write transaction for the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use threadhub_core::error::AppError;
use threadhub_core::result::AppResult;
use threadhub_core::types::CommentId;
use threadhub_entity::{ClosureEdge, Comment, NewComment};

use super::state::{MemoryState, StoredComment};
use crate::store::StoreTransaction;

/// Writes staged against an in-memory store.
///
/// Reads see committed state overlaid with this transaction's own writes.
/// Nothing becomes visible to other readers until [`StoreTransaction::commit`].
pub struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    sequence: Arc<AtomicU64>,
    comments: Vec<StoredComment>,
    edges: Vec<ClosureEdge>,
    cleared: HashSet<CommentId>,
}

impl MemoryTransaction {
    pub(crate) fn new(state: Arc<RwLock<MemoryState>>, sequence: Arc<AtomicU64>) -> Self {
        Self {
            state,
            sequence,
            comments: Vec::new(),
            edges: Vec::new(),
            cleared: HashSet::new(),
        }
    }

    fn staged_comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments
            .iter()
            .map(|stored| &stored.comment)
            .find(|comment| comment.id == id)
    }

    fn committed_edges_visible(&self, id: CommentId) -> bool {
        !self.cleared.contains(&id)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_comment(&mut self, id: CommentId) -> AppResult<Option<Comment>> {
        if let Some(comment) = self.staged_comment(id) {
            return Ok(Some(comment.clone()));
        }
        Ok(self.state.read().await.comment(id).cloned())
    }

    async fn insert_comment(&mut self, new: NewComment) -> AppResult<Comment> {
        if let Some(parent_id) = new.parent_id {
            if self.find_comment(parent_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Failed to insert comment: parent comment {parent_id} does not exist"
                )));
            }
        }

        let comment = new.into_comment(CommentId::new(), Utc::now());
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.comments.push(StoredComment {
            comment: comment.clone(),
            seq,
        });
        Ok(comment)
    }

    async fn find_edges(&mut self, id: CommentId) -> AppResult<Vec<ClosureEdge>> {
        let mut edges = if self.committed_edges_visible(id) {
            self.state.read().await.edges_of(id).to_vec()
        } else {
            Vec::new()
        };
        edges.extend(self.edges.iter().filter(|e| e.descendant_id == id).copied());
        edges.sort_by_key(|edge| edge.depth);
        Ok(edges)
    }

    async fn delete_edges(&mut self, id: CommentId) -> AppResult<u64> {
        let committed = if self.committed_edges_visible(id) {
            self.state.read().await.edges_of(id).len()
        } else {
            0
        };
        let before = self.edges.len();
        self.edges.retain(|edge| edge.descendant_id != id);
        self.cleared.insert(id);
        Ok((committed + before - self.edges.len()) as u64)
    }

    async fn insert_edges(&mut self, edges: &[ClosureEdge]) -> AppResult<()> {
        for edge in edges {
            let existing = self.find_edges(edge.descendant_id).await?;
            if existing.iter().any(|e| e.ancestor_id == edge.ancestor_id) {
                return Err(AppError::conflict(format!(
                    "Failed to insert closure edges: edge {} -> {} already exists",
                    edge.descendant_id, edge.ancestor_id
                )));
            }
            self.edges.push(*edge);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        let mut state = this.state.write().await;

        let staged_ids: HashSet<CommentId> = this.comments.iter().map(|s| s.comment.id).collect();
        let exists = |id: CommentId| staged_ids.contains(&id) || state.comments.contains_key(&id);

        for stored in &this.comments {
            if state.comments.contains_key(&stored.comment.id) {
                return Err(AppError::conflict(format!(
                    "Comment {} already exists",
                    stored.comment.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for edge in &this.edges {
            let pair = (edge.descendant_id, edge.ancestor_id);
            if !seen.insert(pair)
                || (!this.cleared.contains(&edge.descendant_id)
                    && state.has_edge(edge.descendant_id, edge.ancestor_id))
            {
                return Err(AppError::conflict(format!(
                    "Closure edge {} -> {} already exists",
                    edge.descendant_id, edge.ancestor_id
                )));
            }
            if !exists(edge.descendant_id) || !exists(edge.ancestor_id) {
                return Err(AppError::consistency(format!(
                    "Closure edge {} -> {} references a missing comment",
                    edge.descendant_id, edge.ancestor_id
                )));
            }
        }

        for id in &this.cleared {
            state.remove_edges_of(*id);
        }
        let (comment_count, edge_count) = (this.comments.len(), this.edges.len());
        for stored in this.comments {
            state.comments.insert(stored.comment.id, stored);
        }
        for edge in this.edges {
            state.insert_edge(edge);
        }

        debug!(
            comments = comment_count,
            edges = edge_count,
            "Committed in-memory transaction"
        );
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        debug!(
            discarded_comments = self.comments.len(),
            discarded_edges = self.edges.len(),
            "Rolled back in-memory transaction"
        );
        Ok(())
    }
}
