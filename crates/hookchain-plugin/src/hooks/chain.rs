//! Delegation to the displaced handler.
//!
//! Every override must pass the call on: to the handler it displaced when
//! there was one, otherwise to the host's standard implementation. These
//! helpers do exactly that, so an override body reads
//! `chain::planner(prev.as_deref(), session, query, params)`.

use hookchain_core::AppResult;
use hookchain_core::host::{ExecFlags, ParamList, PlannedStmt, Query, QueryDesc, ScanDirection};

use super::definitions::{
    ExecutorEndFn, ExecutorFinishFn, ExecutorRunFn, ExecutorStartFn, PlannerFn,
};
use crate::session::Session;

/// Calls the previous planner or the standard planner.
pub fn planner(
    prev: Option<&PlannerFn>,
    session: &Session,
    query: &Query,
    params: &ParamList,
) -> AppResult<PlannedStmt> {
    match prev {
        Some(handler) => handler(session, query, params),
        None => session.host().standard_planner(session, query, params),
    }
}

/// Calls the previous executor start or the standard one.
pub fn executor_start(
    prev: Option<&ExecutorStartFn>,
    session: &Session,
    qd: &mut QueryDesc,
    flags: ExecFlags,
) -> AppResult<()> {
    match prev {
        Some(handler) => handler(session, qd, flags),
        None => session.host().standard_executor_start(session, qd, flags),
    }
}

/// Calls the previous executor run or the standard one.
pub fn executor_run(
    prev: Option<&ExecutorRunFn>,
    session: &Session,
    qd: &mut QueryDesc,
    direction: ScanDirection,
    count: u64,
    execute_once: bool,
) -> AppResult<()> {
    match prev {
        Some(handler) => handler(session, qd, direction, count, execute_once),
        None => session
            .host()
            .standard_executor_run(session, qd, direction, count, execute_once),
    }
}

/// Calls the previous executor finish or the standard one.
pub fn executor_finish(
    prev: Option<&ExecutorFinishFn>,
    session: &Session,
    qd: &mut QueryDesc,
) -> AppResult<()> {
    match prev {
        Some(handler) => handler(session, qd),
        None => session.host().standard_executor_finish(session, qd),
    }
}

/// Calls the previous executor end or the standard one.
pub fn executor_end(
    prev: Option<&ExecutorEndFn>,
    session: &Session,
    qd: &mut QueryDesc,
) -> AppResult<()> {
    match prev {
        Some(handler) => handler(session, qd),
        None => session.host().standard_executor_end(session, qd),
    }
}
