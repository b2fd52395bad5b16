//! Convenience result type alias for hookchain.

use crate::error::AppError;

/// A specialized `Result` type for hookchain operations.
pub type AppResult<T> = Result<T, AppError>;
