//! Error type for the scramble module.
//!
//! Invalid settings are reported as `ScrambleError` and map onto
//! `hookchain_core::error::AppError` when they cross into the core.

use hookchain_core::error::AppError;
use thiserror::Error;

/// Errors raised while preparing the scramble transform.
#[derive(Debug, Error)]
pub enum ScrambleError {
    /// The replacement sequence is empty.
    #[error("Replacement sequence must not be empty")]
    EmptyReplacement,

    /// No column type was configured.
    #[error("No column types configured")]
    NoColumnTypes,

    /// A configured column type is not known to the host.
    #[error("Unknown column type '{name}'")]
    UnknownColumnType {
        /// The configured name.
        name: String,
    },

    /// A configured column type is not length-prefixed.
    #[error("Column type '{name}' is not a variable-length type")]
    FixedWidthColumnType {
        /// The configured name.
        name: String,
    },
}

impl From<ScrambleError> for AppError {
    fn from(err: ScrambleError) -> Self {
        AppError::configuration(err.to_string())
    }
}
