//! Tree-shaped reads over the closure table.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, error};

use threadhub_core::error::AppError;
use threadhub_core::types::{CommentId, PostId};
use threadhub_database::CommentStore;
use threadhub_entity::{Comment, CommentView, QueryOptions, RelatedComment, ThreadNode};

/// Answers ancestor, descendant, reply, and thread queries.
///
/// List views (`replies_of`, `replies_count`, `top_level`) leave deleted
/// comments out. Structural views (`ancestors_of`, `descendants_of`,
/// `thread_of`) keep them as tombstones so subtrees stay reachable.
#[derive(Clone)]
pub struct TreeQueryService {
    /// Comment store.
    store: Arc<dyn CommentStore>,
}

impl std::fmt::Debug for TreeQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeQueryService").finish_non_exhaustive()
    }
}

impl TreeQueryService {
    /// Creates a new tree query service.
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    /// A single comment as a view.
    pub async fn comment(
        &self,
        id: CommentId,
        options: QueryOptions,
    ) -> Result<CommentView, AppError> {
        let comment = self.require(id).await?;
        let counts = self.store.count_children(&[id], options.include_deleted).await?;
        let replies = counts.get(&id).copied().unwrap_or(0);
        Ok(CommentView::new(comment, replies, options))
    }

    /// Proper ancestors of `id`, nearest first.
    pub async fn ancestors_of(
        &self,
        id: CommentId,
        options: QueryOptions,
    ) -> Result<Vec<CommentView>, AppError> {
        self.require(id).await?;
        let related = self.store.find_ancestors(id).await?;
        debug!(comment_id = %id, count = related.len(), "Loaded ancestors");
        self.related_views(related, options).await
    }

    /// Proper descendants of `id`, by depth then creation time.
    pub async fn descendants_of(
        &self,
        id: CommentId,
        options: QueryOptions,
    ) -> Result<Vec<CommentView>, AppError> {
        self.require(id).await?;
        let related = self.store.find_descendants(id).await?;
        debug!(comment_id = %id, count = related.len(), "Loaded descendants");
        self.related_views(related, options).await
    }

    /// Direct replies of `id` in creation order.
    pub async fn replies_of(
        &self,
        id: CommentId,
        options: QueryOptions,
    ) -> Result<Vec<CommentView>, AppError> {
        self.require(id).await?;
        let children = self.store.find_children(id, options.include_deleted).await?;
        self.views(children, options).await
    }

    /// Number of direct replies of `id`.
    pub async fn replies_count(&self, id: CommentId, options: QueryOptions) -> Result<u64, AppError> {
        self.require(id).await?;
        let counts = self.store.count_children(&[id], options.include_deleted).await?;
        Ok(counts.get(&id).copied().unwrap_or(0))
    }

    /// Top-level comments of a post, newest first.
    pub async fn top_level(
        &self,
        post_id: PostId,
        options: QueryOptions,
    ) -> Result<Vec<CommentView>, AppError> {
        let roots = self.store.find_roots(post_id, options.include_deleted).await?;
        debug!(post_id = %post_id, count = roots.len(), "Loaded top-level comments");
        self.views(roots, options).await
    }

    /// The whole thread containing `id`, rooted at its top-level comment.
    pub async fn thread_of(
        &self,
        id: CommentId,
        options: QueryOptions,
    ) -> Result<ThreadNode, AppError> {
        let anchor = self.require(id).await?;
        let root = self.resolve_root(anchor).await?;

        let mut children: HashMap<CommentId, Vec<Comment>> = HashMap::new();
        let mut visited = HashSet::from([root.id]);
        let mut queue = VecDeque::from([root.id]);
        while let Some(parent_id) = queue.pop_front() {
            let replies = self.store.find_children(parent_id, true).await?;
            for reply in &replies {
                if !visited.insert(reply.id) {
                    error!(comment_id = %reply.id, "Comment reached twice while assembling thread");
                    return Err(AppError::consistency(format!(
                        "Comment {} appears more than once in thread {}",
                        reply.id, root.id
                    )));
                }
                queue.push_back(reply.id);
            }
            children.insert(parent_id, replies);
        }

        let ids: Vec<CommentId> = visited.into_iter().collect();
        let counts = self.store.count_children(&ids, options.include_deleted).await?;
        debug!(root_id = %root.id, size = ids.len(), "Assembled thread");

        Ok(build_node(root, &mut children, &counts, options))
    }

    async fn require(&self, id: CommentId) -> Result<Comment, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Comment {id} not found")))
    }

    /// Follow `parent_id` links up to the top-level comment.
    ///
    /// The anchor's closure rows fix how many hops the walk may take; a
    /// longer parent chain means the two disagree.
    async fn resolve_root(&self, anchor: Comment) -> Result<Comment, AppError> {
        let depth = self.store.find_edges(anchor.id).await?.len().saturating_sub(1);
        let anchor_id = anchor.id;
        let mut seen = HashSet::from([anchor.id]);
        let mut current = anchor;
        while let Some(parent_id) = current.parent_id {
            if seen.len() > depth {
                error!(comment_id = %anchor_id, depth, "Parent chain longer than closure depth");
                return Err(AppError::consistency(format!(
                    "Parent chain of comment {anchor_id} is longer than its closure depth {depth}"
                )));
            }
            let parent = self.store.find_by_id(parent_id).await?.ok_or_else(|| {
                AppError::consistency(format!(
                    "Comment {} references missing parent {parent_id}",
                    current.id
                ))
            })?;
            if !seen.insert(parent.id) {
                error!(comment_id = %parent.id, "Parent chain loops");
                return Err(AppError::consistency(format!(
                    "Parent chain of comment {} loops at {}",
                    current.id, parent.id
                )));
            }
            current = parent;
        }
        Ok(current)
    }

    async fn views(
        &self,
        comments: Vec<Comment>,
        options: QueryOptions,
    ) -> Result<Vec<CommentView>, AppError> {
        let ids: Vec<CommentId> = comments.iter().map(|c| c.id).collect();
        let counts = self.store.count_children(&ids, options.include_deleted).await?;
        Ok(comments
            .into_iter()
            .map(|comment| {
                let replies = counts.get(&comment.id).copied().unwrap_or(0);
                CommentView::new(comment, replies, options)
            })
            .collect())
    }

    async fn related_views(
        &self,
        related: Vec<RelatedComment>,
        options: QueryOptions,
    ) -> Result<Vec<CommentView>, AppError> {
        let ids: Vec<CommentId> = related.iter().map(|r| r.comment.id).collect();
        let counts = self.store.count_children(&ids, options.include_deleted).await?;
        Ok(related
            .into_iter()
            .map(|r| {
                let replies = counts.get(&r.comment.id).copied().unwrap_or(0);
                CommentView::new(r.comment, replies, options).with_depth(r.depth)
            })
            .collect())
    }
}

fn build_node(
    comment: Comment,
    children: &mut HashMap<CommentId, Vec<Comment>>,
    counts: &HashMap<CommentId, u64>,
    options: QueryOptions,
) -> ThreadNode {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| build_node(child, children, counts, options))
        .collect();
    let count = counts.get(&comment.id).copied().unwrap_or(0);
    ThreadNode {
        comment: CommentView::new(comment, count, options),
        replies,
    }
}
