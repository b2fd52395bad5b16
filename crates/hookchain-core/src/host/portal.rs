//! Drives one query through every executor entry point.

use tracing::debug;

use super::dest::DestReceiver;
use super::executor::Executor;
use super::query::{ExecFlags, ParamList, Query, QueryDesc, ScanDirection};
use crate::result::AppResult;

/// Plans and executes `query`, delivering its rows to `dest`.
///
/// Calls planner, executor start, executor run (forward, all rows), executor
/// finish and executor end in that order, then destroys whatever destination
/// the descriptor holds at the end. Returns the number of rows processed.
///
/// On error the remaining entry points are skipped and the destination is
/// dropped without being destroyed, mirroring an aborted transaction.
pub fn run_query(
    entry: &dyn Executor,
    query: &Query,
    params: ParamList,
    dest: Box<dyn DestReceiver>,
) -> AppResult<u64> {
    debug!(query = %query.source_text, "Running query");

    let plan = entry.planner(query, &params)?;
    let mut qd = QueryDesc::new(plan, params, dest);

    entry.executor_start(&mut qd, ExecFlags::default())?;
    entry.executor_run(&mut qd, ScanDirection::Forward, 0, true)?;
    entry.executor_finish(&mut qd)?;

    let processed = qd.estate.as_ref().map_or(0, |e| e.processed);
    entry.executor_end(&mut qd)?;

    let mut dest = qd.into_dest();
    dest.destroy();

    debug!(query = %query.source_text, processed, "Query complete");
    Ok(processed)
}
