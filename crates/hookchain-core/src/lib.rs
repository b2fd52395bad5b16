//! # hookchain-core
//!
//! Core crate for hookchain. Contains the model of the host process boundary
//! (tuples, variable-length values, query descriptors, destinations, the
//! scratch memory context and the host's standard entry points), the
//! configuration schema, and the unified error system.
//!
//! This crate has **no** internal dependencies on other hookchain crates.

pub mod config;
pub mod error;
pub mod host;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
