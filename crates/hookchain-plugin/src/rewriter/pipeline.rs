//! Stage registration and per-stream dispatch.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use hookchain_core::host::{
    CmdType, CommandDest, DestNone, DestReceiver, MemoryContext, QueryDesc, TupleDesc, TupleSlot,
};
use hookchain_core::{AppError, AppResult};

use super::downstream::Downstream;
use super::stage::{OutputRewriter, StageContext};
use crate::hooks::chain;
use crate::hooks::definitions::{ExecutorRunFn, executor_run_handler};
use crate::session::Session;

/// Name the core's own executor run override is attributed to.
pub const PIPELINE_MODULE: &str = "hookchain";

/// A stage together with the module that registered it.
#[derive(Clone)]
pub struct RegisteredRewriter {
    /// Registering module.
    pub module: Rc<str>,
    /// The stage.
    pub rewriter: Rc<dyn OutputRewriter>,
}

impl fmt::Debug for RegisteredRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredRewriter")
            .field("module", &self.module)
            .finish()
    }
}

/// All registered stages of a host process, in registration order.
#[derive(Debug, Default)]
pub struct RewriterChain {
    entries: RefCell<Vec<RegisteredRewriter>>,
    hook_installed: Cell<bool>,
}

impl RewriterChain {
    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no stage is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Registering module of each stage, in invocation order.
    pub fn modules(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|e| e.module.to_string())
            .collect()
    }

    /// Number of stages `module` registered.
    pub fn count_for(&self, module: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| &*e.module == module)
            .count()
    }

    /// Whether the core's executor run override is installed.
    pub fn is_hooked(&self) -> bool {
        self.hook_installed.get()
    }

    pub(crate) fn push(&self, module: Rc<str>, rewriter: Rc<dyn OutputRewriter>) {
        self.entries
            .borrow_mut()
            .push(RegisteredRewriter { module, rewriter });
    }

    /// Marks the override as installed, returning whether it was not before.
    pub(crate) fn claim_hook(&self) -> bool {
        !self.hook_installed.replace(true)
    }

    /// Stages whose filter accepts `qd`, in registration order.
    pub(crate) fn select(&self, qd: &QueryDesc) -> Vec<ActiveStage> {
        let entries = self.entries.borrow().clone();
        entries
            .into_iter()
            .filter(|e| e.rewriter.filter(qd))
            .map(ActiveStage::new)
            .collect()
    }
}

/// A stage taking part in one stream.
pub(crate) struct ActiveStage {
    pub(crate) module: Rc<str>,
    pub(crate) rewriter: Rc<dyn OutputRewriter>,
    pub(crate) context: StageContext,
    started: bool,
    shut_down: bool,
    destroyed: bool,
}

impl ActiveStage {
    fn new(entry: RegisteredRewriter) -> Self {
        Self {
            module: entry.module,
            rewriter: entry.rewriter,
            context: StageContext::empty(),
            started: false,
            shut_down: false,
            destroyed: false,
        }
    }
}

/// Shared state of one stream passing through the pipeline.
struct StreamState {
    terminal: Option<Box<dyn DestReceiver>>,
    stages: Vec<ActiveStage>,
    memory: Rc<MemoryContext>,
    stopped: Cell<bool>,
    rows: u64,
}

impl StreamState {
    fn terminal(&mut self) -> AppResult<&mut dyn DestReceiver> {
        match self.terminal.as_deref_mut() {
            Some(terminal) => Ok(terminal),
            None => Err(AppError::internal("Terminal destination already released")),
        }
    }

    /// Terminal first, then every stage in order. Stops at the first failure.
    fn startup(&mut self, operation: CmdType, desc: &TupleDesc) -> AppResult<()> {
        self.terminal()?.startup(operation, desc)?;
        for stage in &mut self.stages {
            stage.started = true;
            stage.context = stage.rewriter.startup(operation, desc).map_err(|e| {
                warn!(module = %stage.module, error = %e, "Stage startup failed");
                e
            })?;
        }
        Ok(())
    }

    fn receive(&mut self, slot: &mut TupleSlot) -> AppResult<bool> {
        self.rows += 1;
        let StreamState {
            terminal,
            stages,
            memory,
            stopped,
            ..
        } = self;
        let terminal = terminal
            .as_deref_mut()
            .ok_or_else(|| AppError::internal("Terminal destination already released"))?;
        stopped.set(false);
        Downstream::new(stages, terminal, memory, stopped).send(slot)
    }

    /// Shuts down every started stage that has not been shut down yet.
    /// Keeps going past failures and reports the first one.
    fn shutdown_stages(&mut self) -> AppResult<()> {
        let mut first_error = None;
        for stage in &mut self.stages {
            if !stage.started || stage.shut_down {
                continue;
            }
            stage.shut_down = true;
            if let Err(e) = stage.rewriter.shutdown(&mut stage.context) {
                warn!(module = %stage.module, error = %e, "Stage shutdown failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Shutdown where still owed, then destroy, exactly once per stage.
    fn finalize(&mut self) -> AppResult<()> {
        let result = self.shutdown_stages();
        for stage in &mut self.stages {
            if stage.destroyed {
                continue;
            }
            stage.destroyed = true;
            stage.rewriter.destroy(std::mem::take(&mut stage.context));
        }
        result
    }
}

/// The destination the pipeline presents to the executor while a stream is
/// attached.
struct RewriterDest {
    state: Rc<RefCell<StreamState>>,
}

impl DestReceiver for RewriterDest {
    fn startup(&mut self, operation: CmdType, desc: &TupleDesc) -> AppResult<()> {
        self.state.borrow_mut().startup(operation, desc)
    }

    fn receive_slot(&mut self, slot: &mut TupleSlot) -> AppResult<bool> {
        self.state.borrow_mut().receive(slot)
    }

    fn shutdown(&mut self) -> AppResult<()> {
        let mut state = self.state.borrow_mut();
        let stages = state.shutdown_stages();
        let terminal = state.terminal()?.shutdown();
        stages.and(terminal)
    }

    fn destroy(&mut self) {
        let mut state = self.state.borrow_mut();
        if let Err(e) = state.finalize() {
            warn!(error = %e, "Stage finalization failed during destroy");
        }
        if let Some(mut terminal) = state.terminal.take() {
            terminal.destroy();
        }
    }

    fn kind(&self) -> CommandDest {
        CommandDest::Rewriter
    }
}

/// A stream with the pipeline interposed in front of its destination.
///
/// Created by [`attach`](ActiveStream::attach), which swaps the query's
/// destination. [`detach`](ActiveStream::detach) finalizes the stages and
/// puts the terminal back. If the guard is dropped without detaching, the
/// stages are still finalized.
#[must_use]
pub(crate) struct ActiveStream {
    state: Rc<RefCell<StreamState>>,
    detached: bool,
}

impl ActiveStream {
    /// Interposes the stages that accept `qd`. Returns `None` when none does,
    /// leaving the destination untouched.
    pub(crate) fn attach(
        chain: &RewriterChain,
        qd: &mut QueryDesc,
        memory: Rc<MemoryContext>,
    ) -> Option<Self> {
        let stages = chain.select(qd);
        if stages.is_empty() {
            trace!(query = %qd.source_text, "No stage accepts this query");
            return None;
        }
        let stage_count = stages.len();

        let state = Rc::new(RefCell::new(StreamState {
            terminal: None,
            stages,
            memory,
            stopped: Cell::new(false),
            rows: 0,
        }));
        let terminal = qd.replace_dest(Box::new(RewriterDest {
            state: Rc::clone(&state),
        }));
        state.borrow_mut().terminal = Some(terminal);

        debug!(query = %qd.source_text, stages = stage_count, "Pipeline attached");
        Some(Self {
            state,
            detached: false,
        })
    }

    /// Finalizes every stage and restores the terminal destination.
    pub(crate) fn detach(mut self, qd: &mut QueryDesc) -> AppResult<()> {
        self.detached = true;
        let mut state = self.state.borrow_mut();
        let result = state.finalize();

        if qd.dest.kind() == CommandDest::Rewriter {
            let terminal: Box<dyn DestReceiver> = match state.terminal.take() {
                Some(terminal) => terminal,
                None => Box::new(DestNone),
            };
            qd.replace_dest(terminal);
        } else {
            warn!(
                dest = ?qd.dest.kind(),
                "Destination replaced during run; leaving it in place"
            );
        }

        debug!(query = %qd.source_text, rows = state.rows, "Pipeline detached");
        result
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Ok(mut state) = self.state.try_borrow_mut() {
            if let Err(e) = state.finalize() {
                warn!(error = %e, "Stage finalization failed on drop");
            }
        }
    }
}

/// Builds the core's executor run override.
///
/// Interposes the pipeline for the duration of the run when the session's
/// nesting policy allows it at the current depth, then always delegates.
pub(crate) fn pipeline_handler(prev: Option<Rc<ExecutorRunFn>>) -> Rc<ExecutorRunFn> {
    executor_run_handler(move |session: &Session, qd, direction, count, execute_once| {
        let stream = if session.pipeline_applies() {
            ActiveStream::attach(session.rewriters(), qd, Rc::clone(session.memory()))
        } else {
            None
        };

        let result = chain::executor_run(prev.as_deref(), session, qd, direction, count, execute_once);

        match stream {
            Some(stream) => result.and(stream.detach(qd)),
            None => result,
        }
    })
}
