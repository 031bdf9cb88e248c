//! Nested thread structure for hierarchical display.

use serde::{Deserialize, Serialize};

use threadhub_core::types::CommentId;

use super::view::CommentView;

/// A comment together with its replies, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode {
    /// The comment at this node.
    pub comment: CommentView,
    /// Replies in creation order.
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    /// Create a leaf node.
    pub fn leaf(comment: CommentView) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    /// Number of comments in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(ThreadNode::size).sum::<usize>()
    }

    /// Find the node for `id` in this subtree.
    pub fn find(&self, id: CommentId) -> Option<&ThreadNode> {
        if self.comment.id == id {
            return Some(self);
        }
        self.replies.iter().find_map(|reply| reply.find(id))
    }

    /// Comment ids in depth-first pre-order.
    pub fn ids(&self) -> Vec<CommentId> {
        let mut out = Vec::with_capacity(self.size());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.comment.id);
            stack.extend(node.replies.iter().rev());
        }
        out
    }
}
