//! Closure edge entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use threadhub_core::types::CommentId;

use crate::comment::Comment;

/// "`ancestor_id` is an ancestor of `descendant_id` at `depth` hops."
///
/// Every comment owns one self-edge at depth 0 plus one edge per proper
/// ancestor. Edges are written once, when the descendant is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct ClosureEdge {
    /// The lower comment of the pair.
    pub descendant_id: CommentId,
    /// The upper comment of the pair.
    pub ancestor_id: CommentId,
    /// Number of parent hops between the two.
    #[sqlx(try_from = "i32")]
    pub depth: u32,
}

impl ClosureEdge {
    /// The depth-0 edge every comment has to itself.
    pub fn self_edge(id: CommentId) -> Self {
        Self {
            descendant_id: id,
            ancestor_id: id,
            depth: 0,
        }
    }

    /// Edge from `descendant_id` to the ancestor of `parent_edge`, one hop
    /// further away than the parent is.
    pub fn extend(descendant_id: CommentId, parent_edge: &ClosureEdge) -> Self {
        Self {
            descendant_id,
            ancestor_id: parent_edge.ancestor_id,
            depth: parent_edge.depth + 1,
        }
    }

    /// Check if this is the self-referential edge.
    pub fn is_self_edge(&self) -> bool {
        self.ancestor_id == self.descendant_id && self.depth == 0
    }

    /// Check if this is a direct parent-child relationship.
    pub fn is_direct(&self) -> bool {
        self.depth == 1
    }
}

/// A comment joined with its closure depth relative to a query anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RelatedComment {
    /// The related comment row.
    #[sqlx(flatten)]
    pub comment: Comment,
    /// Hops between the comment and the anchor.
    #[sqlx(try_from = "i32")]
    pub depth: u32,
}
