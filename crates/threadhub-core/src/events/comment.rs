//! Comment-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PostId, UserId};

/// Events related to comment operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommentEvent {
    /// A comment was created and its closure rows committed.
    Created {
        /// The new comment.
        comment_id: CommentId,
        /// The post it belongs to.
        post_id: PostId,
        /// The comment's author.
        author_id: UserId,
        /// The parent comment, if this is a reply.
        parent_id: Option<CommentId>,
        /// Author of the parent comment, if this is a reply.
        parent_author_id: Option<UserId>,
    },
    /// A comment's content was edited.
    Edited {
        /// The comment ID.
        comment_id: CommentId,
    },
    /// A comment was soft-deleted.
    Deleted {
        /// The comment ID.
        comment_id: CommentId,
        /// The post it belongs to.
        post_id: PostId,
    },
    /// A soft-deleted comment was restored.
    Restored {
        /// The comment ID.
        comment_id: CommentId,
        /// The post it belongs to.
        post_id: PostId,
    },
}

impl CommentEvent {
    /// The comment this event is about.
    pub fn comment_id(&self) -> CommentId {
        match self {
            Self::Created { comment_id, .. }
            | Self::Edited { comment_id }
            | Self::Deleted { comment_id, .. }
            | Self::Restored { comment_id, .. } => *comment_id,
        }
    }
}
