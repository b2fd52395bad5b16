//! The hookable executor entry points.

use super::query::{ExecFlags, ParamList, PlannedStmt, Query, QueryDesc, ScanDirection};
use crate::result::AppResult;

/// The entry points the host routes every query through.
///
/// Whatever implements this trait is what the host calls "the executor": with
/// no extensions loaded it is the host's standard implementation, otherwise it
/// is a dispatcher that consults the installed handler chains first. Nested
/// queries re-enter through the same object.
pub trait Executor {
    /// Turns a parsed statement into a plan.
    fn planner(&self, query: &Query, params: &ParamList) -> AppResult<PlannedStmt>;

    /// Creates execution state.
    fn executor_start(&self, qd: &mut QueryDesc, flags: ExecFlags) -> AppResult<()>;

    /// Produces rows into `qd.dest`. A `count` of zero means all rows.
    fn executor_run(
        &self,
        qd: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    ) -> AppResult<()>;

    /// Runs end-of-statement work.
    fn executor_finish(&self, qd: &mut QueryDesc) -> AppResult<()>;

    /// Tears down execution state.
    fn executor_end(&self, qd: &mut QueryDesc) -> AppResult<()>;
}

/// The host's built-in implementation of each entry point.
///
/// These are what a handler chain falls back to when it has no previous
/// handler. `entry` is the executor to use for any nested query the standard
/// implementation issues, so nested work passes through the installed chains
/// again.
pub trait StandardHooks {
    /// Built-in planner.
    fn standard_planner(
        &self,
        entry: &dyn Executor,
        query: &Query,
        params: &ParamList,
    ) -> AppResult<PlannedStmt>;

    /// Built-in executor start.
    fn standard_executor_start(
        &self,
        entry: &dyn Executor,
        qd: &mut QueryDesc,
        flags: ExecFlags,
    ) -> AppResult<()>;

    /// Built-in executor run.
    fn standard_executor_run(
        &self,
        entry: &dyn Executor,
        qd: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    ) -> AppResult<()>;

    /// Built-in executor finish.
    fn standard_executor_finish(&self, entry: &dyn Executor, qd: &mut QueryDesc) -> AppResult<()>;

    /// Built-in executor end.
    fn standard_executor_end(&self, entry: &dyn Executor, qd: &mut QueryDesc) -> AppResult<()>;
}
