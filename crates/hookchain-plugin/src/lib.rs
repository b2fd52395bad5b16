//! # hookchain-plugin
//!
//! Composition layer that lets independently loaded modules share the host's
//! interception points. Provides:
//!
//! - An extension-point registry where `install` returns the displaced handler
//! - A per-module handle for registering row-transform stages
//! - The row-transform pipeline interposed in front of a query's destination
//! - The load bracket (`begin_module_load` / `end_module_load`) and module introspection
//! - Optional dynamic loading via `libloading` (feature `dynamic`)

pub mod api;
pub mod hooks;
pub mod loader;
pub mod macros;
pub mod modules;
pub mod prelude;
pub mod rewriter;
pub mod session;
pub mod traits;

pub use hookchain_core;

pub use api::context::ModuleInit;
pub use api::handle::PluginHandle;
pub use hooks::definitions::HookKind;
pub use hooks::registry::{ExtensionPoint, HookRegistry};
pub use modules::{ModuleEntryFn, ModuleRecord, ModuleState};
pub use rewriter::{Downstream, OutputRewriter, SlotRewrite, StageContext};
pub use session::Session;
pub use traits::Module;
