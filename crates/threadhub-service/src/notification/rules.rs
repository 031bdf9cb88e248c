//! Notification recipient rules: who hears about a new comment.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use threadhub_core::error::AppError;
use threadhub_core::events::CommentEvent;
use threadhub_core::types::{PostId, UserId};
use threadhub_database::CommentStore;
use threadhub_entity::{Notification, NotificationKind};

/// Looks up who wrote a post. Posts live outside the comment engine.
#[async_trait]
pub trait PostDirectory: Send + Sync + 'static {
    /// The author of `post_id`, if the post is known.
    async fn post_author(&self, post_id: PostId) -> Result<Option<UserId>, AppError>;
}

/// Post directory held in memory, filled by the embedding application.
#[derive(Debug, Default)]
pub struct InMemoryPostDirectory {
    authors: RwLock<HashMap<PostId, UserId>>,
}

impl InMemoryPostDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the author of a post.
    pub async fn register(&self, post_id: PostId, author_id: UserId) {
        self.authors.write().await.insert(post_id, author_id);
    }
}

#[async_trait]
impl PostDirectory for InMemoryPostDirectory {
    async fn post_author(&self, post_id: PostId) -> Result<Option<UserId>, AppError> {
        Ok(self.authors.read().await.get(&post_id).copied())
    }
}

/// Maps comment events to at most one notification.
///
/// A reply notifies the parent comment's author, a top-level comment
/// notifies the post's author. Nobody is notified about their own comment,
/// and a comment deleted before the event is handled notifies no one.
#[derive(Clone)]
pub struct NotificationRules {
    /// Comment store, to re-check the comment's delete flag.
    store: Arc<dyn CommentStore>,
    /// Post author lookup.
    posts: Arc<dyn PostDirectory>,
}

impl std::fmt::Debug for NotificationRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRules").finish_non_exhaustive()
    }
}

impl NotificationRules {
    /// Creates a new rules engine.
    pub fn new(store: Arc<dyn CommentStore>, posts: Arc<dyn PostDirectory>) -> Self {
        Self { store, posts }
    }

    /// The notification `event` should produce, if any.
    pub async fn notification_for(
        &self,
        event: &CommentEvent,
    ) -> Result<Option<Notification>, AppError> {
        let CommentEvent::Created {
            comment_id,
            post_id,
            author_id,
            parent_author_id,
            ..
        } = *event
        else {
            return Ok(None);
        };

        let (recipient, kind) = match parent_author_id {
            Some(parent_author) => (Some(parent_author), NotificationKind::ReplyToComment),
            None => (
                self.posts.post_author(post_id).await?,
                NotificationKind::CommentOnPost,
            ),
        };
        let Some(recipient) = recipient else {
            return Ok(None);
        };
        if recipient == author_id {
            return Ok(None);
        }

        match self.store.find_by_id(comment_id).await? {
            Some(comment) if !comment.is_deleted => Ok(Some(Notification::new(
                recipient, kind, author_id, comment_id, post_id,
            ))),
            _ => Ok(None),
        }
    }
}
