//! Derivation of a comment's closure edges from its parent's edges.

use std::collections::HashSet;

use tracing::{debug, error};

use threadhub_core::error::AppError;
use threadhub_core::types::CommentId;
use threadhub_database::StoreTransaction;
use threadhub_entity::{ClosureEdge, Comment};

/// Writes closure edges for newly created comments.
///
/// A comment Y with parent P gets the self-edge `(Y, Y, 0)` plus
/// `(Y, A, d + 1)` for every parent edge `(P, A, d)`. The parent's rows are
/// checked first and a malformed set aborts the write instead of being
/// copied into the child.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureMaintainer;

impl ClosureMaintainer {
    /// Creates a new maintainer.
    pub fn new() -> Self {
        Self
    }

    /// Replace the closure edges of `comment` inside `tx`.
    ///
    /// Stale edges are cleared first, which is a no-op for a fresh comment
    /// and makes rebuilding an existing one idempotent.
    pub async fn populate(
        &self,
        tx: &mut dyn StoreTransaction,
        comment: &Comment,
    ) -> Result<Vec<ClosureEdge>, AppError> {
        let cleared = tx.delete_edges(comment.id).await?;
        if cleared > 0 {
            debug!(comment_id = %comment.id, cleared, "Cleared stale closure edges");
        }

        let parent_edges = match comment.parent_id {
            Some(parent_id) => tx.find_edges(parent_id).await?,
            None => Vec::new(),
        };

        let edges = Self::derive_edges(comment.id, comment.parent_id, &parent_edges)
            .inspect_err(|e| {
                error!(comment_id = %comment.id, error = %e, "Refusing to derive closure edges");
            })?;
        tx.insert_edges(&edges).await?;

        debug!(
            comment_id = %comment.id,
            edges = edges.len(),
            "Closure edges written"
        );
        Ok(edges)
    }

    /// Compute the edges of `comment_id` from its parent's edges.
    ///
    /// `parent_edges` must be every edge whose descendant is `parent_id`.
    /// Ordering of the input does not matter; the output is ordered by depth.
    pub fn derive_edges(
        comment_id: CommentId,
        parent_id: Option<CommentId>,
        parent_edges: &[ClosureEdge],
    ) -> Result<Vec<ClosureEdge>, AppError> {
        let Some(parent_id) = parent_id else {
            return Ok(vec![ClosureEdge::self_edge(comment_id)]);
        };

        if parent_id == comment_id {
            return Err(AppError::consistency(format!(
                "Comment {comment_id} cannot be its own parent"
            )));
        }

        let mut sorted: Vec<&ClosureEdge> = parent_edges.iter().collect();
        sorted.sort_by_key(|edge| edge.depth);
        Self::check_parent_edges(comment_id, parent_id, &sorted)?;

        let mut edges = Vec::with_capacity(sorted.len() + 1);
        edges.push(ClosureEdge::self_edge(comment_id));
        edges.extend(sorted.into_iter().map(|edge| ClosureEdge::extend(comment_id, edge)));
        Ok(edges)
    }

    fn check_parent_edges(
        comment_id: CommentId,
        parent_id: CommentId,
        sorted: &[&ClosureEdge],
    ) -> Result<(), AppError> {
        if sorted.is_empty() {
            return Err(AppError::consistency(format!(
                "Parent comment {parent_id} has no closure edges"
            )));
        }

        let mut ancestors = HashSet::with_capacity(sorted.len());
        for (expected_depth, edge) in sorted.iter().enumerate() {
            if edge.descendant_id != parent_id {
                return Err(AppError::consistency(format!(
                    "Edge {} -> {} does not belong to parent {parent_id}",
                    edge.descendant_id, edge.ancestor_id
                )));
            }
            if edge.depth as usize != expected_depth {
                return Err(AppError::consistency(format!(
                    "Parent {parent_id} has edge at depth {} where depth {expected_depth} was expected",
                    edge.depth
                )));
            }
            if !ancestors.insert(edge.ancestor_id) {
                return Err(AppError::consistency(format!(
                    "Parent {parent_id} lists ancestor {} twice",
                    edge.ancestor_id
                )));
            }
        }

        if sorted[0].ancestor_id != parent_id {
            return Err(AppError::consistency(format!(
                "Parent {parent_id} has no self-edge at depth 0"
            )));
        }
        if ancestors.contains(&comment_id) {
            return Err(AppError::consistency(format!(
                "Comment {comment_id} is already an ancestor of its parent {parent_id}"
            )));
        }
        Ok(())
    }
}
