//! Row-transform pipeline and scratch memory configuration.

use serde::{Deserialize, Serialize};

/// Which executor-run invocations get their output routed through the
/// rewriter pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedPolicy {
    /// Only the outermost invocation of a logical request.
    #[default]
    Outermost,
    /// Every invocation, including nested sub-evaluations.
    EveryLevel,
}

/// Pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Nested invocation policy.
    #[serde(default)]
    pub nested: NestedPolicy,
}

/// Scratch memory context settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Upper bound on live scratch bytes. Allocations beyond it fail.
    #[serde(default)]
    pub scratch_limit_bytes: Option<usize>,
}
