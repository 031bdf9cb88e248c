//! Comment write operations with author checks and closure maintenance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use threadhub_core::config::CommentsConfig;
use threadhub_core::error::{AppError, ErrorKind};
use threadhub_core::events::{CommentEvent, DomainEvent};
use threadhub_core::traits::EventPublisher;
use threadhub_core::types::{CommentId, PostId, UserId};
use threadhub_database::{CommentStore, StoreTransaction};
use threadhub_entity::{Comment, NewComment};

use crate::content::ContentValidator;
use crate::context::RequestContext;
use crate::tree::ClosureMaintainer;

/// Request to create a comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// The post being commented on.
    pub post_id: PostId,
    /// Parent comment, `None` for a top-level comment.
    pub parent_id: Option<CommentId>,
    /// Raw content, checked by [`ContentValidator`] before storage.
    #[validate(length(min = 1, message = "Comment content cannot be empty"))]
    pub content: String,
}

/// Manages comment creation and lifecycle.
#[derive(Clone)]
pub struct CommentService {
    /// Comment store.
    store: Arc<dyn CommentStore>,
    /// Closure edge writer.
    maintainer: ClosureMaintainer,
    /// Content allow-list.
    validator: ContentValidator,
    /// Post-commit event sink.
    publisher: Arc<dyn EventPublisher>,
    /// Deepest reply level accepted on create.
    max_thread_depth: u32,
}

impl std::fmt::Debug for CommentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentService")
            .field("validator", &self.validator)
            .field("max_thread_depth", &self.max_thread_depth)
            .finish_non_exhaustive()
    }
}

impl CommentService {
    /// Creates a new comment service.
    pub fn new(
        store: Arc<dyn CommentStore>,
        maintainer: ClosureMaintainer,
        validator: ContentValidator,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            maintainer,
            validator,
            publisher,
            max_thread_depth: CommentsConfig::default().max_thread_depth,
        }
    }

    /// Limit how deep replies may nest.
    pub fn with_max_thread_depth(mut self, max_thread_depth: u32) -> Self {
        self.max_thread_depth = max_thread_depth;
        self
    }

    /// Gets a comment by ID.
    pub async fn get(&self, id: CommentId) -> Result<Comment, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Comment {id} not found")))
    }

    /// Creates a comment and its closure edges in one transaction.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        req.validate()?;
        let content = self.validator.validate(&req.content)?;

        let mut tx = self.store.begin().await?;
        let (comment, parent_author_id) =
            match self.create_in(tx.as_mut(), ctx.actor_id, &req, content).await {
                Ok(created) => created,
                Err(e) => {
                    if e.is(ErrorKind::Consistency) {
                        error!(
                            post_id = %req.post_id,
                            parent_id = ?req.parent_id,
                            error = %e,
                            "Closure table inconsistent; comment creation rolled back"
                        );
                    }
                    if let Err(rollback) = tx.rollback().await {
                        warn!(error = %rollback, "Rollback after failed comment creation failed");
                    }
                    return Err(e);
                }
            };
        tx.commit().await?;

        info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            parent_id = ?comment.parent_id,
            author_id = %comment.author_id,
            "Comment created"
        );

        self.publisher.publish(DomainEvent::comment(
            ctx.actor_id,
            CommentEvent::Created {
                comment_id: comment.id,
                post_id: comment.post_id,
                author_id: comment.author_id,
                parent_id: comment.parent_id,
                parent_author_id,
            },
        ));

        Ok(comment)
    }

    async fn create_in(
        &self,
        tx: &mut dyn StoreTransaction,
        author_id: UserId,
        req: &CreateCommentRequest,
        content: String,
    ) -> Result<(Comment, Option<UserId>), AppError> {
        let parent_author_id = match req.parent_id {
            Some(parent_id) => {
                let parent = tx.find_comment(parent_id).await?.ok_or_else(|| {
                    AppError::validation(format!("Parent comment {parent_id} does not exist"))
                })?;
                if parent.post_id != req.post_id {
                    return Err(AppError::validation(format!(
                        "Parent comment {parent_id} belongs to a different post"
                    )));
                }
                Some(parent.author_id)
            }
            None => None,
        };

        let comment = tx
            .insert_comment(NewComment {
                post_id: req.post_id,
                author_id,
                parent_id: req.parent_id,
                content,
            })
            .await?;
        let edges = self.maintainer.populate(tx, &comment).await?;
        let depth = edges.len().saturating_sub(1);
        if depth > self.max_thread_depth as usize {
            return Err(AppError::validation(format!(
                "Replies may nest at most {} levels deep",
                self.max_thread_depth
            )));
        }

        Ok((comment, parent_author_id))
    }

    /// Replaces the content of a comment. Author only; deleted comments
    /// cannot be edited.
    pub async fn edit(
        &self,
        ctx: &RequestContext,
        id: CommentId,
        content: &str,
    ) -> Result<Comment, AppError> {
        let comment = self.authorize(ctx, id, "edit").await?;
        if comment.is_deleted {
            return Err(AppError::validation(format!(
                "Comment {id} is deleted and cannot be edited"
            )));
        }
        let content = self.validator.validate(content)?;

        let updated = self
            .store
            .update_content(id, &content)
            .await?
            .ok_or_else(|| {
                AppError::validation(format!("Comment {id} is deleted and cannot be edited"))
            })?;

        info!(comment_id = %id, actor_id = %ctx.actor_id, "Comment edited");
        self.publisher.publish(DomainEvent::comment(
            ctx.actor_id,
            CommentEvent::Edited { comment_id: id },
        ));
        Ok(updated)
    }

    /// Soft-deletes a comment. Closure edges are left untouched.
    pub async fn soft_delete(&self, ctx: &RequestContext, id: CommentId) -> Result<(), AppError> {
        self.set_deleted(ctx, id, true).await
    }

    /// Restores a soft-deleted comment.
    pub async fn restore(&self, ctx: &RequestContext, id: CommentId) -> Result<(), AppError> {
        self.set_deleted(ctx, id, false).await
    }

    async fn set_deleted(
        &self,
        ctx: &RequestContext,
        id: CommentId,
        deleted: bool,
    ) -> Result<(), AppError> {
        let action = if deleted { "delete" } else { "restore" };
        let comment = self.authorize(ctx, id, action).await?;
        if comment.is_deleted == deleted {
            return Ok(());
        }

        let updated = self
            .store
            .set_deleted(id, deleted)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Comment {id} not found")))?;

        info!(comment_id = %id, actor_id = %ctx.actor_id, deleted, "Comment delete flag changed");

        let event = if deleted {
            CommentEvent::Deleted {
                comment_id: id,
                post_id: updated.post_id,
            }
        } else {
            CommentEvent::Restored {
                comment_id: id,
                post_id: updated.post_id,
            }
        };
        self.publisher.publish(DomainEvent::comment(ctx.actor_id, event));
        Ok(())
    }

    /// Loads a comment and checks the actor wrote it.
    async fn authorize(
        &self,
        ctx: &RequestContext,
        id: CommentId,
        action: &str,
    ) -> Result<Comment, AppError> {
        let comment = self.get(id).await?;
        if !comment.is_authored_by(ctx.actor_id) {
            warn!(
                comment_id = %id,
                actor_id = %ctx.actor_id,
                author_id = %comment.author_id,
                action,
                "Refused: actor is not the comment author"
            );
            return Err(AppError::authorization(format!(
                "Only the author may {action} comment {id}"
            )));
        }
        Ok(comment)
    }
}
