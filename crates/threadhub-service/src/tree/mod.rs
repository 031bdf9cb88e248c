//! Closure-table maintenance, tree queries, and repair tooling.

pub mod maintenance;
pub mod query;
pub mod repair;

pub use maintenance::ClosureMaintainer;
pub use query::TreeQueryService;
pub use repair::{ClosureIssue, ClosureRepairService, RebuildReport, VerifyReport};
