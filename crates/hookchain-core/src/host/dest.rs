//! Row destinations.

use serde::Serialize;

use super::query::CmdType;
use super::tuple::{TupleDesc, TupleSlot};
use crate::result::AppResult;

/// Tag identifying what kind of destination a receiver is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandDest {
    /// Discards all rows.
    None,
    /// Sends rows to the client.
    Remote,
    /// Collects rows for later inspection.
    Tuplestore,
    /// The row-transform pipeline interposed in front of another destination.
    Rewriter,
}

/// Four-method interface through which the executor delivers rows.
///
/// The executor calls `startup` once, then `receive_slot` for each row until it
/// runs out of rows or a call returns `false`, then `shutdown`. The owner of the
/// query calls `destroy` once after execution ends.
pub trait DestReceiver {
    /// Prepares to receive rows of the given shape.
    fn startup(&mut self, operation: CmdType, desc: &TupleDesc) -> AppResult<()>;

    /// Accepts one row. Returning `false` asks the executor to stop.
    fn receive_slot(&mut self, slot: &mut TupleSlot) -> AppResult<bool>;

    /// Called after the last row.
    fn shutdown(&mut self) -> AppResult<()>;

    /// Releases the destination.
    fn destroy(&mut self);

    /// What kind of destination this is.
    fn kind(&self) -> CommandDest;
}

/// Destination that discards every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct DestNone;

impl DestReceiver for DestNone {
    fn startup(&mut self, _operation: CmdType, _desc: &TupleDesc) -> AppResult<()> {
        Ok(())
    }

    fn receive_slot(&mut self, _slot: &mut TupleSlot) -> AppResult<bool> {
        Ok(true)
    }

    fn shutdown(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn destroy(&mut self) {}

    fn kind(&self) -> CommandDest {
        CommandDest::None
    }
}
