//! Module-facing API: the per-module handle and the init context.

pub mod context;
pub mod handle;

pub use context::ModuleInit;
pub use handle::PluginHandle;
