//! # plugin-scramble
//!
//! Demonstration module for the row-transform pipeline. Every non-null value
//! of a configured text-like column is replaced by the configured sequence
//! repeated once per byte of the original (default U+1F4A9, four bytes in
//! UTF-8). The planner override logs a notice for every planned query.
//!
//! Settings come from the `modules.scramble` configuration section.

pub mod config;
pub mod error;
pub mod plugin;
pub mod rewriter;

pub use config::ScrambleSettings;
pub use error::ScrambleError;
pub use plugin::ScrambleModule;
pub use rewriter::ScrambleRewriter;

hookchain_plugin::declare_module!("scramble", crate::plugin::ScrambleModule);
