//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hookchain_core::config::AppConfig;
use hookchain_core::config::pipeline::NestedPolicy;
use hookchain_core::host::mock::{DestLog, MockHost, RecordingDest};
use hookchain_core::host::{
    CmdType, Datum, ParamList, Query, QueryDesc, TupleDesc, TupleSlot, portal,
};
use hookchain_core::{AppError, AppResult};
use hookchain_plugin::{Downstream, OutputRewriter, Session, SlotRewrite, StageContext};

/// Shared, ordered log of observed events.
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Creates an empty event log.
pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Session over a fresh mock host with the given nesting policy.
pub fn session_with(policy: NestedPolicy) -> (Rc<MockHost>, Session) {
    let mut config = AppConfig::default();
    config.pipeline.nested = policy;
    session_with_config(config)
}

/// Session over a fresh mock host with default configuration.
pub fn session() -> (Rc<MockHost>, Session) {
    session_with_config(AppConfig::default())
}

/// Session over a fresh mock host.
pub fn session_with_config(config: AppConfig) -> (Rc<MockHost>, Session) {
    let host = Rc::new(MockHost::with_sample_catalog());
    let session = Session::new(host.clone(), config);
    (host, session)
}

/// Runs `query` through `session` into a fresh recording destination.
pub fn run(session: &Session, query: &Query) -> (AppResult<u64>, Rc<RefCell<DestLog>>) {
    let (dest, log) = RecordingDest::new();
    let result = portal::run_query(session, query, ParamList::default(), Box::new(dest));
    (result, log)
}

/// Runs `query` into the given destination.
pub fn run_into(session: &Session, query: &Query, dest: RecordingDest) -> AppResult<u64> {
    portal::run_query(session, query, ParamList::default(), Box::new(dest))
}

/// Stage that logs every callback as `"<name>:<callback>"` and can be told
/// to fail at a given point.
pub struct Recorder {
    pub name: &'static str,
    pub log: EventLog,
    pub fail_startup: bool,
    pub fail_receive: bool,
    pub filter_calls: Rc<Cell<usize>>,
    pub accept: bool,
}

impl Recorder {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            fail_startup: false,
            fail_receive: false,
            filter_calls: Rc::new(Cell::new(0)),
            accept: true,
        }
    }

    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{}:{event}", self.name));
    }
}

impl OutputRewriter for Recorder {
    fn filter(&self, _qd: &QueryDesc) -> bool {
        self.filter_calls.set(self.filter_calls.get() + 1);
        self.accept
    }

    fn startup(&self, _operation: CmdType, _desc: &TupleDesc) -> AppResult<StageContext> {
        self.record("startup");
        if self.fail_startup {
            return Err(AppError::plugin(format!("{} startup failed", self.name)));
        }
        Ok(StageContext::new(0usize))
    }

    fn receive(
        &self,
        cx: &mut StageContext,
        slot: &mut TupleSlot,
        next: Downstream<'_>,
    ) -> AppResult<bool> {
        self.record("receive");
        if self.fail_receive {
            return Err(AppError::plugin(format!("{} receive failed", self.name)));
        }
        if let Some(rows) = cx.get_mut::<usize>() {
            *rows += 1;
        }
        next.send(slot)
    }

    fn shutdown(&self, _cx: &mut StageContext) -> AppResult<()> {
        self.record("shutdown");
        Ok(())
    }

    fn destroy(&self, _cx: StageContext) {
        self.record("destroy");
    }
}

/// Stage that appends `suffix` to every non-null length-prefixed column.
pub struct Append {
    pub suffix: &'static [u8],
}

impl OutputRewriter for Append {
    fn receive(
        &self,
        _cx: &mut StageContext,
        slot: &mut TupleSlot,
        next: Downstream<'_>,
    ) -> AppResult<bool> {
        let memory = next.memory();
        let mut rewrite = SlotRewrite::new(slot, memory);
        let targets: Vec<(usize, Vec<u8>)> = rewrite
            .slot()
            .values()
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_varlena().map(|v| (i, v.payload().to_vec())))
            .collect();
        for (attno, payload) in targets {
            let suffix = self.suffix;
            rewrite.replace_varlena(attno, payload.len() + suffix.len(), |buf| {
                buf[..payload.len()].copy_from_slice(&payload);
                buf[payload.len()..].copy_from_slice(suffix);
            })?;
        }
        next.send(rewrite.slot())
    }
}

/// Stage that ignores downstream's answer and always claims it wants more.
pub struct Stubborn;

impl OutputRewriter for Stubborn {
    fn receive(
        &self,
        _cx: &mut StageContext,
        slot: &mut TupleSlot,
        next: Downstream<'_>,
    ) -> AppResult<bool> {
        next.send(slot)?;
        Ok(true)
    }
}

/// Text payload of column `attno` in a received row.
pub fn text_at(row: &[Datum], attno: usize) -> Option<String> {
    row.get(attno)
        .and_then(|d| d.as_varlena())
        .and_then(|v| v.as_str().map(str::to_string))
}

/// Registers each stage under its own module name.
pub fn load_stage<R: OutputRewriter + 'static>(
    session: &Session,
    module: &str,
    stage: R,
) -> AppResult<()> {
    session
        .load_module(module, |cx| cx.api().register_output_rewriter(stage))
        .map(|_| ())
}
