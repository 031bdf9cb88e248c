//! In-memory comment store for single-process deployments and tests.

mod state;
pub mod store;
pub mod transaction;

pub use store::MemoryCommentStore;
pub use transaction::MemoryTransaction;
