//! # threadhub-service
//!
//! Business logic service layer for ThreadHub. Services orchestrate the
//! comment store, closure-table maintenance, content validation, and
//! domain events to implement the comment engine's use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod comment;
pub mod content;
pub mod context;
pub mod events;
pub mod notification;
pub mod tree;

pub use comment::{CommentService, CreateCommentRequest};
pub use content::ContentValidator;
pub use context::RequestContext;
pub use events::EventBus;
pub use notification::{
    InMemoryPostDirectory, NotificationDispatcher, NotificationRules, NotificationSink,
    PostDirectory, TracingNotificationSink,
};
pub use tree::{
    ClosureIssue, ClosureMaintainer, ClosureRepairService, RebuildReport, TreeQueryService,
    VerifyReport,
};
