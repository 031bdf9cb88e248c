//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadhub_core::types::{CommentId, NotificationId, PostId, UserId};

/// Why a user is being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone commented on the recipient's post.
    CommentOnPost,
    /// Someone replied to the recipient's comment.
    ReplyToComment,
}

impl NotificationKind {
    /// Short human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::CommentOnPost => "New comment",
            Self::ReplyToComment => "New reply",
        }
    }
}

/// A notification to be delivered to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub recipient_id: UserId,
    /// Notification kind.
    pub kind: NotificationKind,
    /// The user whose comment triggered this notification.
    pub actor_id: UserId,
    /// The comment that triggered it.
    pub comment_id: CommentId,
    /// The post the comment belongs to.
    pub post_id: PostId,
    /// Notification title.
    pub title: String,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification of `kind` for `recipient_id`.
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        actor_id: UserId,
        comment_id: CommentId,
        post_id: PostId,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_id,
            kind,
            actor_id,
            comment_id,
            post_id,
            title: kind.title().to_string(),
            created_at: Utc::now(),
        }
    }
}
