//! Read-side projection of a comment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadhub_core::types::{CommentId, PostId, UserId};

use super::model::Comment;

/// Options shared by every tree query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Return deleted comments with their content and keep them in list
    /// views. Reserved for internal tooling such as restore flows.
    #[serde(default)]
    pub include_deleted: bool,
}

impl QueryOptions {
    /// Options that expose deleted comments.
    pub fn including_deleted() -> Self {
        Self {
            include_deleted: true,
        }
    }
}

/// A comment as handed to request handlers.
///
/// Deleted comments are rendered as tombstones: `is_deleted` is set and
/// `content` is `None` unless the query asked to include deleted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    /// Comment identifier.
    pub id: CommentId,
    /// Author identifier.
    pub author_id: UserId,
    /// Post identifier.
    pub post_id: PostId,
    /// Parent comment, if any.
    pub parent_id: Option<CommentId>,
    /// Content, suppressed for tombstones.
    pub content: Option<String>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Hop distance from the query anchor (ancestor/descendant queries).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// Number of direct replies. Deleted replies are counted only when the
    /// query ran with [`QueryOptions::include_deleted`].
    pub replies_count: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl CommentView {
    /// Project a comment, suppressing deleted content unless requested.
    pub fn new(comment: Comment, replies_count: u64, options: QueryOptions) -> Self {
        let content = if comment.is_deleted && !options.include_deleted {
            None
        } else {
            Some(comment.content)
        };

        Self {
            id: comment.id,
            author_id: comment.author_id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            content,
            is_deleted: comment.is_deleted,
            depth: None,
            replies_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }

    /// Attach the hop distance from the query anchor.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Whether this entry is a tombstone (deleted, content hidden).
    pub fn is_tombstone(&self) -> bool {
        self.is_deleted && self.content.is_none()
    }
}
