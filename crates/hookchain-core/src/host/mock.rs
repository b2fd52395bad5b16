//! In-memory host for development and testing.
//!
//! Simulates the host's standard planner and executor over fully materialized
//! relations, and provides a destination that records everything it receives.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::datum::{Datum, TypeOid};
use super::dest::{CommandDest, DestNone, DestReceiver};
use super::executor::{Executor, StandardHooks};
use super::portal;
use super::query::{
    CmdType, EState, ExecFlags, ParamList, PlannedStmt, Query, QueryDesc, Relation, ScanDirection,
};
use super::tuple::{ColumnDesc, TupleDesc, TupleSlot};
use crate::error::AppError;
use crate::result::AppResult;

/// Mock host implementing the standard entry points.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Relations known to the host, by name.
    catalog: BTreeMap<String, Relation>,
    /// Names of standard entry points in the order they were called.
    standard_calls: RefCell<Vec<&'static str>>,
}

impl MockHost {
    /// Creates a host with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host whose catalog holds the sample relations.
    pub fn with_sample_catalog() -> Self {
        let mut host = Self::new();
        host.add_relation(users_relation());
        host.add_relation(notes_relation());
        host
    }

    /// Adds (or replaces) a relation.
    pub fn add_relation(&mut self, relation: Relation) {
        self.catalog.insert(relation.name.clone(), relation);
    }

    /// Looks up a relation by name.
    pub fn relation(&self, name: &str) -> AppResult<&Relation> {
        self.catalog
            .get(name)
            .ok_or_else(|| AppError::not_found(format!("Relation '{name}' does not exist")))
    }

    /// Names of all relations.
    pub fn relation_names(&self) -> Vec<String> {
        self.catalog.keys().cloned().collect()
    }

    /// Standard entry points called so far, in order.
    pub fn standard_calls(&self) -> Vec<&'static str> {
        self.standard_calls.borrow().clone()
    }

    fn record(&self, name: &'static str) {
        tracing::trace!("[MockHost] {name}");
        self.standard_calls.borrow_mut().push(name);
    }
}

impl StandardHooks for MockHost {
    fn standard_planner(
        &self,
        _entry: &dyn Executor,
        query: &Query,
        _params: &ParamList,
    ) -> AppResult<PlannedStmt> {
        self.record("planner");
        Ok(PlannedStmt {
            command: query.command,
            source_text: query.source_text.clone(),
            relation: query.relation.clone(),
            subplans: query.subqueries.clone(),
        })
    }

    fn standard_executor_start(
        &self,
        _entry: &dyn Executor,
        qd: &mut QueryDesc,
        flags: ExecFlags,
    ) -> AppResult<()> {
        self.record("executor_start");
        if qd.estate.is_some() {
            return Err(AppError::execution("Executor already started for this query"));
        }
        qd.estate = Some(EState {
            flags,
            ..EState::default()
        });
        Ok(())
    }

    fn standard_executor_run(
        &self,
        entry: &dyn Executor,
        qd: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        _execute_once: bool,
    ) -> AppResult<()> {
        self.record("executor_run");
        if qd.estate.is_none() {
            return Err(AppError::execution("Executor run called before executor start"));
        }

        // Sub-evaluations re-enter through the dispatcher before the outer scan.
        let subplans = qd.plan.subplans.clone();
        for sub in &subplans {
            portal::run_query(entry, sub, ParamList::default(), Box::new(DestNone))?;
        }

        if direction == ScanDirection::NoMovement {
            return Ok(());
        }

        let send = qd.operation.returns_tuples();
        let desc = qd.tuple_desc();
        if send {
            qd.dest.startup(qd.operation, &desc)?;
        }

        let total = qd.plan.relation.rows.len();
        let mut sent = 0u64;
        loop {
            if count != 0 && sent >= count {
                break;
            }
            let Some(estate) = qd.estate.as_mut() else {
                break;
            };
            let index = match direction {
                ScanDirection::Forward if estate.position < total => {
                    estate.position += 1;
                    estate.position - 1
                }
                ScanDirection::Backward if estate.position > 0 => {
                    estate.position -= 1;
                    estate.position
                }
                _ => break,
            };
            estate.processed += 1;
            sent += 1;

            let mut slot = TupleSlot::new(desc.clone(), qd.plan.relation.rows[index].clone())?;
            if send && !qd.dest.receive_slot(&mut slot)? {
                break;
            }
        }

        if send {
            qd.dest.shutdown()?;
        }
        Ok(())
    }

    fn standard_executor_finish(&self, _entry: &dyn Executor, qd: &mut QueryDesc) -> AppResult<()> {
        self.record("executor_finish");
        let estate = qd
            .estate
            .as_mut()
            .ok_or_else(|| AppError::execution("Executor finish called before executor start"))?;
        estate.finished = true;
        Ok(())
    }

    fn standard_executor_end(&self, _entry: &dyn Executor, qd: &mut QueryDesc) -> AppResult<()> {
        self.record("executor_end");
        qd.estate
            .take()
            .map(|_| ())
            .ok_or_else(|| AppError::execution("Executor end called before executor start"))
    }
}

/// Lets the mock host act as an executor with no extensions installed.
impl Executor for MockHost {
    fn planner(&self, query: &Query, params: &ParamList) -> AppResult<PlannedStmt> {
        self.standard_planner(self, query, params)
    }

    fn executor_start(&self, qd: &mut QueryDesc, flags: ExecFlags) -> AppResult<()> {
        self.standard_executor_start(self, qd, flags)
    }

    fn executor_run(
        &self,
        qd: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    ) -> AppResult<()> {
        self.standard_executor_run(self, qd, direction, count, execute_once)
    }

    fn executor_finish(&self, qd: &mut QueryDesc) -> AppResult<()> {
        self.standard_executor_finish(self, qd)
    }

    fn executor_end(&self, qd: &mut QueryDesc) -> AppResult<()> {
        self.standard_executor_end(self, qd)
    }
}

/// One recorded destination call.
#[derive(Debug, Clone, PartialEq)]
pub enum DestEvent {
    /// `startup` with the statement kind and column count.
    Startup(CmdType, usize),
    /// `receive_slot` with the row's values.
    Row(Vec<Datum>),
    /// `shutdown`.
    Shutdown,
    /// `destroy`.
    Destroy,
}

/// Everything a [`RecordingDest`] saw.
#[derive(Debug, Default)]
pub struct DestLog {
    /// Calls in order.
    pub events: Vec<DestEvent>,
}

impl DestLog {
    /// Values of every received row.
    pub fn rows(&self) -> Vec<Vec<Datum>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DestEvent::Row(values) => Some(values.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of times `event` was recorded.
    pub fn count(&self, event: &DestEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

type Probe = Box<dyn FnMut(&TupleSlot)>;

/// Destination that records every call into a shared log.
pub struct RecordingDest {
    log: Rc<RefCell<DestLog>>,
    accept_limit: Option<usize>,
    received: usize,
    probe: Option<Probe>,
}

impl RecordingDest {
    /// Creates a destination and a handle to its log.
    pub fn new() -> (Self, Rc<RefCell<DestLog>>) {
        let log = Rc::new(RefCell::new(DestLog::default()));
        let dest = Self {
            log: Rc::clone(&log),
            accept_limit: None,
            received: 0,
            probe: None,
        };
        (dest, log)
    }

    /// Return `false` from `receive_slot` once `limit` rows have been received.
    pub fn accept_limit(mut self, limit: usize) -> Self {
        self.accept_limit = Some(limit);
        self
    }

    /// Runs `probe` on every received row before recording it.
    pub fn with_probe(mut self, probe: impl FnMut(&TupleSlot) + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }
}

impl DestReceiver for RecordingDest {
    fn startup(&mut self, operation: CmdType, desc: &TupleDesc) -> AppResult<()> {
        self.log
            .borrow_mut()
            .events
            .push(DestEvent::Startup(operation, desc.natts()));
        Ok(())
    }

    fn receive_slot(&mut self, slot: &mut TupleSlot) -> AppResult<bool> {
        if let Some(probe) = self.probe.as_mut() {
            probe(slot);
        }
        self.received += 1;
        self.log
            .borrow_mut()
            .events
            .push(DestEvent::Row(slot.values().to_vec()));
        Ok(self.accept_limit.is_none_or(|limit| self.received < limit))
    }

    fn shutdown(&mut self) -> AppResult<()> {
        self.log.borrow_mut().events.push(DestEvent::Shutdown);
        Ok(())
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().events.push(DestEvent::Destroy);
    }

    fn kind(&self) -> CommandDest {
        CommandDest::Tuplestore
    }
}

/// Builds a relation from column specs and rows.
pub fn relation(name: &str, columns: &[(&str, TypeOid)], rows: Vec<Vec<Datum>>) -> Relation {
    let desc = TupleDesc::new(
        columns
            .iter()
            .map(|(n, t)| ColumnDesc::new(*n, *t))
            .collect(),
    );
    Relation {
        name: name.to_string(),
        desc: Rc::new(desc),
        rows,
    }
}

/// `users(id int4, name varchar, active bool)` with three rows.
pub fn users_relation() -> Relation {
    relation(
        "users",
        &[
            ("id", TypeOid::Int4),
            ("name", TypeOid::Varchar),
            ("active", TypeOid::Bool),
        ],
        vec![
            vec![Datum::Int4(1), Datum::text("ann"), Datum::Bool(true)],
            vec![Datum::Int4(2), Datum::text("bob"), Datum::Bool(false)],
            vec![Datum::Int4(3), Datum::Null, Datum::Bool(true)],
        ],
    )
}

/// `notes(id int8, body text, score float8)` with two rows.
pub fn notes_relation() -> Relation {
    relation(
        "notes",
        &[
            ("id", TypeOid::Int8),
            ("body", TypeOid::Text),
            ("score", TypeOid::Float8),
        ],
        vec![
            vec![Datum::Int8(10), Datum::text("hello"), Datum::Float8(0.5)],
            vec![Datum::Int8(11), Datum::text(""), Datum::Float8(1.5)],
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_run_delivers_all_rows() {
        let host = MockHost::with_sample_catalog();
        let query = Query::select(users_relation());
        let (dest, log) = RecordingDest::new();

        let processed = portal::run_query(&host, &query, ParamList::default(), Box::new(dest))
            .expect("run");

        assert_eq!(processed, 3);
        let log = log.borrow();
        assert_eq!(log.events.first(), Some(&DestEvent::Startup(CmdType::Select, 3)));
        assert_eq!(log.rows().len(), 3);
        assert_eq!(log.count(&DestEvent::Shutdown), 1);
        assert_eq!(log.events.last(), Some(&DestEvent::Destroy));
        assert_eq!(
            host.standard_calls(),
            vec!["planner", "executor_start", "executor_run", "executor_finish", "executor_end"]
        );
    }

    #[test]
    fn test_receive_false_stops_scan() {
        let host = MockHost::new();
        let query = Query::select(users_relation());
        let (dest, log) = RecordingDest::new();

        portal::run_query(&host, &query, ParamList::default(), Box::new(dest.accept_limit(1)))
            .expect("run");

        let log = log.borrow();
        assert_eq!(log.rows().len(), 1);
        assert_eq!(log.count(&DestEvent::Shutdown), 1);
    }

    #[test]
    fn test_subqueries_reenter_entry() {
        let host = MockHost::new();
        let query = Query::select(users_relation()).with_subquery(Query::select(notes_relation()));
        let (dest, log) = RecordingDest::new();

        portal::run_query(&host, &query, ParamList::default(), Box::new(dest)).expect("run");

        assert_eq!(log.borrow().rows().len(), 3);
        assert_eq!(
            host.standard_calls().iter().filter(|c| **c == "executor_run").count(),
            2
        );
    }

    #[test]
    fn test_unknown_relation() {
        let host = MockHost::with_sample_catalog();
        assert!(host.relation("users").is_ok());
        let err = host.relation("missing").expect_err("missing");
        assert_eq!(err.kind, crate::error::ErrorKind::NotFound);
    }
}
