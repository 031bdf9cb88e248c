//! # threadhub-database
//!
//! Storage for comments and their closure table. The [`CommentStore`]
//! trait is the seam the service layer programs against; it has a
//! PostgreSQL implementation built on sqlx repositories and an in-memory
//! implementation for tests and embedded use.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryCommentStore;
pub use repositories::PgCommentStore;
pub use store::{CommentStore, StoreTransaction};
