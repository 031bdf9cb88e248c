//! # threadhub
//!
//! Threaded comment engine backed by a closure table.
//!
//! [`Engine`] wires configuration, a comment store backend, and the
//! service layer together and exposes the command and query surface a
//! request layer needs. [`init_logging`] installs the tracing subscriber
//! described by [`LoggingConfig`](threadhub_core::config::LoggingConfig).

pub mod engine;
pub mod logging;

pub use engine::Engine;
pub use logging::init_logging;

pub use threadhub_core::{AppError, AppResult, ErrorKind};
pub use threadhub_entity::{CommentView, QueryOptions, ThreadNode};
pub use threadhub_service::RequestContext;
