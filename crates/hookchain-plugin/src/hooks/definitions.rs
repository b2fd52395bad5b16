//! Extension point definitions and handler signatures.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use hookchain_core::AppResult;
use hookchain_core::host::{ExecFlags, ParamList, PlannedStmt, Query, QueryDesc, ScanDirection};

use crate::session::Session;

/// The host entry points a module can intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Turns a parsed statement into a plan.
    Planner,
    /// Creates execution state for a plan.
    ExecutorStart,
    /// Drives row production into the query's destination.
    ExecutorRun,
    /// Runs end-of-statement work.
    ExecutorFinish,
    /// Tears down execution state.
    ExecutorEnd,
}

impl HookKind {
    /// Every extension point, in host call order.
    pub const ALL: [HookKind; 5] = [
        Self::Planner,
        Self::ExecutorStart,
        Self::ExecutorRun,
        Self::ExecutorFinish,
        Self::ExecutorEnd,
    ];

    /// Returns the host's name for this slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner_hook",
            Self::ExecutorStart => "executor_start_hook",
            Self::ExecutorRun => "executor_run_hook",
            Self::ExecutorFinish => "executor_finish_hook",
            Self::ExecutorEnd => "executor_end_hook",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Planner handler.
pub type PlannerFn = dyn Fn(&Session, &Query, &ParamList) -> AppResult<PlannedStmt>;

/// Executor start handler.
pub type ExecutorStartFn = dyn Fn(&Session, &mut QueryDesc, ExecFlags) -> AppResult<()>;

/// Executor run handler. `count` of zero means all rows.
pub type ExecutorRunFn =
    dyn Fn(&Session, &mut QueryDesc, ScanDirection, u64, bool) -> AppResult<()>;

/// Executor finish handler.
pub type ExecutorFinishFn = dyn Fn(&Session, &mut QueryDesc) -> AppResult<()>;

/// Executor end handler.
pub type ExecutorEndFn = dyn Fn(&Session, &mut QueryDesc) -> AppResult<()>;

/// Wraps a closure as a planner handler.
pub fn planner_handler(
    f: impl Fn(&Session, &Query, &ParamList) -> AppResult<PlannedStmt> + 'static,
) -> Rc<PlannerFn> {
    Rc::new(f)
}

/// Wraps a closure as an executor start handler.
pub fn executor_start_handler(
    f: impl Fn(&Session, &mut QueryDesc, ExecFlags) -> AppResult<()> + 'static,
) -> Rc<ExecutorStartFn> {
    Rc::new(f)
}

/// Wraps a closure as an executor run handler.
pub fn executor_run_handler(
    f: impl Fn(&Session, &mut QueryDesc, ScanDirection, u64, bool) -> AppResult<()> + 'static,
) -> Rc<ExecutorRunFn> {
    Rc::new(f)
}

/// Wraps a closure as an executor finish handler.
pub fn executor_finish_handler(
    f: impl Fn(&Session, &mut QueryDesc) -> AppResult<()> + 'static,
) -> Rc<ExecutorFinishFn> {
    Rc::new(f)
}

/// Wraps a closure as an executor end handler.
pub fn executor_end_handler(
    f: impl Fn(&Session, &mut QueryDesc) -> AppResult<()> + 'static,
) -> Rc<ExecutorEndFn> {
    Rc::new(f)
}
