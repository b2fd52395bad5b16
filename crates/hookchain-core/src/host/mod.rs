//! Model of the host process boundary.
//!
//! The host owns planning, execution, tuple layout and memory management.
//! hookchain only interposes on a handful of its entry points, so this module
//! describes exactly the surface the composition layer touches:
//!
//! - [`datum`]: column types and values, including length-prefixed values
//! - [`tuple`]: row shapes and the mutable row slot handed to destinations
//! - [`query`]: queries, plans and the query descriptor threaded through execution
//! - [`dest`]: the four-method row destination interface
//! - [`memory`]: the scratch memory context stages allocate replacement values from
//! - [`executor`]: the hookable entry points and the host's standard implementations
//! - [`portal`]: the driver that runs one query through all entry points
//! - [`mock`]: an in-memory host used by tests and the CLI

pub mod datum;
pub mod dest;
pub mod executor;
pub mod memory;
pub mod mock;
pub mod portal;
pub mod query;
pub mod tuple;

pub use datum::{Datum, TypeOid, VARHDRSZ, Varlena};
pub use dest::{CommandDest, DestNone, DestReceiver};
pub use executor::{Executor, StandardHooks};
pub use memory::{MemoryContext, MemoryStats, ScratchValue};
pub use query::{CmdType, EState, ExecFlags, ParamList, PlannedStmt, Query, QueryDesc, Relation, ScanDirection};
pub use tuple::{ColumnDesc, TupleDesc, TupleSlot};
