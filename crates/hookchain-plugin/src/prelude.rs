//! Prelude for convenient imports.

pub use hookchain_core::config::AppConfig;
pub use hookchain_core::host::{
    CmdType, Datum, ExecFlags, ParamList, PlannedStmt, Query, QueryDesc, ScanDirection, TupleDesc,
    TupleSlot, TypeOid, Varlena,
};
pub use hookchain_core::{AppError, AppResult};

pub use crate::api::{ModuleInit, PluginHandle};
pub use crate::hooks::chain;
pub use crate::hooks::definitions::{
    HookKind, executor_end_handler, executor_finish_handler, executor_run_handler,
    executor_start_handler, planner_handler,
};
pub use crate::modules::ModuleRecord;
pub use crate::rewriter::{Downstream, OutputRewriter, SlotRewrite, StageContext};
pub use crate::session::Session;
pub use crate::traits::Module;

pub use crate::declare_module;
