//! Convenience result type alias for ThreadHub.

use crate::error::AppError;

/// A specialized `Result` type for ThreadHub operations.
pub type AppResult<T> = Result<T, AppError>;
