//! Hook system: extension-point registry, handler signatures, and chaining helpers.

pub mod chain;
pub mod definitions;
pub mod registry;

pub use definitions::{
    ExecutorEndFn, ExecutorFinishFn, ExecutorRunFn, ExecutorStartFn, HookKind, PlannerFn,
};
pub use registry::{ChainInfo, ChainLink, ChainSummary, ExtensionPoint, HookRegistry};
