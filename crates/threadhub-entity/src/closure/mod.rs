//! Closure table entities.

pub mod model;

pub use model::{ClosureEdge, RelatedComment};
