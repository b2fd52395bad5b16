//! The continuation a stage hands its row to.

use std::cell::Cell;

use tracing::warn;

use hookchain_core::AppResult;
use hookchain_core::host::{DestReceiver, MemoryContext, TupleSlot};

use super::pipeline::ActiveStage;

/// Everything below the current stage: the remaining stages and the
/// terminal sink.
///
/// Consumed by [`send`](Downstream::send), so a stage delivers each row at
/// most once.
pub struct Downstream<'a> {
    rest: &'a mut [ActiveStage],
    terminal: &'a mut dyn DestReceiver,
    memory: &'a MemoryContext,
    stopped: &'a Cell<bool>,
}

impl<'a> Downstream<'a> {
    pub(crate) fn new(
        rest: &'a mut [ActiveStage],
        terminal: &'a mut dyn DestReceiver,
        memory: &'a MemoryContext,
        stopped: &'a Cell<bool>,
    ) -> Self {
        Self {
            rest,
            terminal,
            memory,
            stopped,
        }
    }

    /// Scratch context for replacement values.
    pub fn memory(&self) -> &'a MemoryContext {
        self.memory
    }

    /// Delivers `slot` to the next stage, or to the terminal sink when no
    /// stage is left. Returns whether downstream wants more rows.
    pub fn send(self, slot: &mut TupleSlot) -> AppResult<bool> {
        let Self {
            rest,
            terminal,
            memory,
            stopped,
        } = self;

        let accepted = match rest.split_first_mut() {
            None => terminal.receive_slot(slot)?,
            Some((stage, rest)) => {
                let next = Downstream::new(rest, terminal, memory, stopped);
                let accepted = stage.rewriter.receive(&mut stage.context, slot, next)?;
                if accepted && stopped.get() {
                    warn!(
                        module = %stage.module,
                        "Stage reported true after downstream asked to stop; keeping stop"
                    );
                    false
                } else {
                    accepted
                }
            }
        };

        if !accepted {
            stopped.set(true);
        }
        Ok(accepted)
    }
}
