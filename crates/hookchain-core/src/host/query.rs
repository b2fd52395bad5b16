//! Queries, plans and query descriptors.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::datum::Datum;
use super::dest::DestReceiver;
use super::tuple::TupleDesc;

/// Kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CmdType {
    /// Row-returning read.
    Select,
    /// Insert.
    Insert,
    /// Update.
    Update,
    /// Delete.
    Delete,
    /// Utility statement.
    Utility,
}

impl CmdType {
    /// Whether statements of this kind deliver rows to their destination.
    pub fn returns_tuples(&self) -> bool {
        matches!(self, Self::Select)
    }
}

impl fmt::Display for CmdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Utility => "UTILITY",
        };
        write!(f, "{name}")
    }
}

/// Direction the executor walks the result in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanDirection {
    /// From first row to last.
    Forward,
    /// From last row to first.
    Backward,
    /// Do not fetch rows.
    NoMovement,
}

/// Flags passed to executor start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecFlags {
    /// Plan only, do not run.
    pub explain_only: bool,
    /// The caller may scan backwards.
    pub backward: bool,
}

/// Bound parameter values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    /// Values in parameter order.
    pub values: Vec<Datum>,
}

/// A named, fully materialized table.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Table name.
    pub name: String,
    /// Row shape.
    pub desc: Rc<TupleDesc>,
    /// Rows in storage order.
    pub rows: Vec<Vec<Datum>>,
}

/// A parsed statement.
#[derive(Debug, Clone)]
pub struct Query {
    /// Original statement text.
    pub source_text: String,
    /// Statement kind.
    pub command: CmdType,
    /// The relation being read.
    pub relation: Relation,
    /// Sub-evaluations executed while this statement runs.
    pub subqueries: Vec<Query>,
}

impl Query {
    /// A `SELECT *` over `relation`.
    pub fn select(relation: Relation) -> Self {
        Self {
            source_text: format!("SELECT * FROM {}", relation.name),
            command: CmdType::Select,
            relation,
            subqueries: Vec::new(),
        }
    }

    /// Adds a nested sub-evaluation.
    pub fn with_subquery(mut self, sub: Query) -> Self {
        self.subqueries.push(sub);
        self
    }
}

/// Output of planning.
#[derive(Debug, Clone)]
pub struct PlannedStmt {
    /// Statement kind.
    pub command: CmdType,
    /// Original statement text.
    pub source_text: String,
    /// The relation to scan.
    pub relation: Relation,
    /// Sub-evaluations, each run as its own nested query.
    pub subplans: Vec<Query>,
}

/// Execution state created by executor start and torn down by executor end.
#[derive(Debug, Clone, Default)]
pub struct EState {
    /// Next row position for a forward scan.
    pub position: usize,
    /// Rows processed so far.
    pub processed: u64,
    /// Set by executor finish.
    pub finished: bool,
    /// Flags the executor was started with.
    pub flags: ExecFlags,
}

/// Per-query descriptor threaded through the executor entry points.
pub struct QueryDesc {
    /// Statement kind.
    pub operation: CmdType,
    /// The plan being executed.
    pub plan: PlannedStmt,
    /// Original statement text.
    pub source_text: String,
    /// Bound parameters.
    pub params: ParamList,
    /// Where rows go. Interposers may swap this for the duration of a run.
    pub dest: Box<dyn DestReceiver>,
    /// Present between executor start and executor end.
    pub estate: Option<EState>,
}

impl QueryDesc {
    /// Creates a descriptor for `plan` delivering to `dest`.
    pub fn new(plan: PlannedStmt, params: ParamList, dest: Box<dyn DestReceiver>) -> Self {
        Self {
            operation: plan.command,
            source_text: plan.source_text.clone(),
            plan,
            params,
            dest,
            estate: None,
        }
    }

    /// Shape of the rows this query produces.
    pub fn tuple_desc(&self) -> Rc<TupleDesc> {
        Rc::clone(&self.plan.relation.desc)
    }

    /// Installs `dest`, returning the destination it replaced.
    pub fn replace_dest(&mut self, dest: Box<dyn DestReceiver>) -> Box<dyn DestReceiver> {
        std::mem::replace(&mut self.dest, dest)
    }

    /// Consumes the descriptor, returning its destination.
    pub fn into_dest(self) -> Box<dyn DestReceiver> {
        self.dest
    }
}

impl fmt::Debug for QueryDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDesc")
            .field("operation", &self.operation)
            .field("source_text", &self.source_text)
            .field("dest", &self.dest.kind())
            .field("estate", &self.estate)
            .finish()
    }
}
