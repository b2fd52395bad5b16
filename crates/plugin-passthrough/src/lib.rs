//! # plugin-passthrough
//!
//! Demonstration module that overrides all five extension points, logs each
//! intercepted call, and always delegates to the previously installed
//! handler or the host default. Logging is at `info` when
//! `modules.passthrough.notice` is set and at `debug` otherwise.

pub mod plugin;

pub use plugin::PassthroughModule;

hookchain_plugin::declare_module!("passthrough", crate::plugin::PassthroughModule);
