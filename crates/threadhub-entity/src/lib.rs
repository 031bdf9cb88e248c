//! # threadhub-entity
//!
//! Domain entity models for ThreadHub. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod closure;
pub mod comment;
pub mod notification;

pub use closure::{ClosureEdge, RelatedComment};
pub use comment::{Comment, CommentView, NewComment, QueryOptions, ThreadNode};
pub use notification::{Notification, NotificationKind};
