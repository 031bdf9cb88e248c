//! Comment commands: create, edit, soft-delete, restore.

pub mod service;

pub use service::{CommentService, CreateCommentRequest};
