//! Engine facade wiring configuration, storage, and services.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use threadhub_core::config::{AppConfig, StoreBackend};
use threadhub_core::error::AppError;
use threadhub_core::events::DomainEvent;
use threadhub_core::types::{CommentId, PostId};
use threadhub_database::migration::run_migrations;
use threadhub_database::{CommentStore, DatabasePool, MemoryCommentStore, PgCommentStore};
use threadhub_entity::{Comment, CommentView, QueryOptions, ThreadNode};
use threadhub_service::{
    ClosureMaintainer, ClosureRepairService, CommentService, ContentValidator,
    CreateCommentRequest, EventBus, NotificationDispatcher, NotificationRules, NotificationSink,
    PostDirectory, RequestContext, TreeQueryService,
};

/// The comment hierarchy engine.
///
/// Queries use default [`QueryOptions`]: deleted comments are left out of
/// reply lists and shown as tombstones in ancestor, descendant, and thread
/// results. Use [`Engine::queries`] for option-aware variants.
pub struct Engine {
    config: AppConfig,
    store: Arc<dyn CommentStore>,
    pool: Option<DatabasePool>,
    events: EventBus,
    comments: CommentService,
    queries: TreeQueryService,
    repair: ClosureRepairService,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.config.store.backend)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open the store selected by `config.store.backend` and build the
    /// services on top of it. The postgres backend runs pending migrations
    /// when `database.run_migrations` is set.
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        let (store, pool): (Arc<dyn CommentStore>, Option<DatabasePool>) =
            match config.store.backend {
                StoreBackend::Memory => {
                    let store: Arc<dyn CommentStore> = Arc::new(MemoryCommentStore::new());
                    (store, None)
                }
                StoreBackend::Postgres => {
                    let pool = DatabasePool::connect(&config.database).await?;
                    if config.database.run_migrations {
                        run_migrations(pool.pool()).await?;
                    }
                    let store: Arc<dyn CommentStore> =
                        Arc::new(PgCommentStore::new(pool.pool().clone()));
                    (store, Some(pool))
                }
            };

        let mut engine = Self::with_store(config, store)?;
        engine.pool = pool;
        Ok(engine)
    }

    /// Build the engine over an existing store.
    pub fn with_store(config: AppConfig, store: Arc<dyn CommentStore>) -> Result<Self, AppError> {
        let events = EventBus::from_config(&config.events);
        let maintainer = ClosureMaintainer::new();
        let validator = ContentValidator::new(&config.comments)?;

        let comments = CommentService::new(
            Arc::clone(&store),
            maintainer,
            validator,
            Arc::new(events.clone()),
        )
        .with_max_thread_depth(config.comments.max_thread_depth);
        let queries = TreeQueryService::new(Arc::clone(&store));
        let repair = ClosureRepairService::new(Arc::clone(&store), maintainer);

        info!(backend = ?config.store.backend, "Comment engine ready");

        Ok(Self {
            config,
            store,
            pool: None,
            events,
            comments,
            queries,
            repair,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The underlying comment store.
    pub fn store(&self) -> &Arc<dyn CommentStore> {
        &self.store
    }

    /// Comment command service.
    pub fn comments(&self) -> &CommentService {
        &self.comments
    }

    /// Tree query service, for option-aware queries.
    pub fn queries(&self) -> &TreeQueryService {
        &self.queries
    }

    /// Closure verification and rebuild tooling.
    pub fn repair(&self) -> &ClosureRepairService {
        &self.repair
    }

    /// The domain event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to domain events published after each committed write.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Start delivering notifications for new comments.
    pub fn spawn_notifications(
        &self,
        posts: Arc<dyn PostDirectory>,
        sink: Arc<dyn NotificationSink>,
    ) -> JoinHandle<()> {
        let rules = NotificationRules::new(Arc::clone(&self.store), posts);
        NotificationDispatcher::new(rules, sink).spawn(self.events.subscribe())
    }

    /// Create a comment, optionally as a reply to `parent_id`.
    pub async fn create_comment(
        &self,
        ctx: &RequestContext,
        post_id: PostId,
        parent_id: Option<CommentId>,
        content: &str,
    ) -> Result<CommentView, AppError> {
        let comment = self
            .comments
            .create(
                ctx,
                CreateCommentRequest {
                    post_id,
                    parent_id,
                    content: content.to_string(),
                },
            )
            .await?;
        Ok(CommentView::new(comment, 0, QueryOptions::default()))
    }

    /// Replace a comment's content. Author only.
    pub async fn edit_comment(
        &self,
        ctx: &RequestContext,
        id: CommentId,
        content: &str,
    ) -> Result<Comment, AppError> {
        self.comments.edit(ctx, id, content).await
    }

    /// Soft-delete a comment. Author only.
    pub async fn soft_delete_comment(
        &self,
        ctx: &RequestContext,
        id: CommentId,
    ) -> Result<(), AppError> {
        self.comments.soft_delete(ctx, id).await
    }

    /// Restore a soft-deleted comment. Author only.
    pub async fn restore_comment(&self, ctx: &RequestContext, id: CommentId) -> Result<(), AppError> {
        self.comments.restore(ctx, id).await
    }

    /// A single comment.
    pub async fn get_comment(&self, id: CommentId) -> Result<CommentView, AppError> {
        self.queries.comment(id, QueryOptions::default()).await
    }

    /// Ancestors of `id`, nearest first.
    pub async fn get_ancestors(&self, id: CommentId) -> Result<Vec<CommentView>, AppError> {
        self.queries.ancestors_of(id, QueryOptions::default()).await
    }

    /// Descendants of `id`, by depth then creation time.
    pub async fn get_descendants(&self, id: CommentId) -> Result<Vec<CommentView>, AppError> {
        self.queries.descendants_of(id, QueryOptions::default()).await
    }

    /// Non-deleted direct replies of `id` in creation order.
    pub async fn get_replies(&self, id: CommentId) -> Result<Vec<CommentView>, AppError> {
        self.queries.replies_of(id, QueryOptions::default()).await
    }

    /// Number of non-deleted direct replies of `id`.
    pub async fn get_replies_count(&self, id: CommentId) -> Result<u64, AppError> {
        self.queries.replies_count(id, QueryOptions::default()).await
    }

    /// The full thread containing `id`.
    pub async fn get_thread(&self, id: CommentId) -> Result<ThreadNode, AppError> {
        self.queries.thread_of(id, QueryOptions::default()).await
    }

    /// Non-deleted top-level comments of a post, newest first.
    pub async fn top_level_comments(&self, post_id: PostId) -> Result<Vec<CommentView>, AppError> {
        self.queries.top_level(post_id, QueryOptions::default()).await
    }

    /// Close the database pool, if any.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
