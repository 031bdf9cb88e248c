//! Comment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use threadhub_core::types::{CommentId, PostId, UserId};

/// A comment on a blog post. Replies point at their parent comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    /// Unique comment identifier.
    pub id: CommentId,
    /// The post this comment belongs to.
    pub post_id: PostId,
    /// The comment author.
    pub author_id: UserId,
    /// Parent comment (null for top-level comments). Immutable.
    pub parent_id: Option<CommentId>,
    /// Validated content with basic HTML formatting.
    pub content: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
    /// When the comment was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Check if this is a top-level comment (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if `user_id` wrote this comment.
    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

/// Data required to create a new comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    /// The post being commented on.
    pub post_id: PostId,
    /// The author.
    pub author_id: UserId,
    /// Parent comment (None for top-level).
    pub parent_id: Option<CommentId>,
    /// Already-validated content.
    pub content: String,
}

impl NewComment {
    /// Materialize the row that a store persists for this request.
    pub fn into_comment(self, id: CommentId, now: DateTime<Utc>) -> Comment {
        Comment {
            id,
            post_id: self.post_id,
            author_id: self.author_id,
            parent_id: self.parent_id,
            content: self.content,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
