//! One host process's view of hookchain: the registry, the pipeline, the
//! loaded modules, and the dispatching executor the host calls into.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, info};

use hookchain_core::config::AppConfig;
use hookchain_core::config::pipeline::NestedPolicy;
use hookchain_core::host::{
    ExecFlags, Executor, MemoryContext, ParamList, PlannedStmt, Query, QueryDesc, ScanDirection,
    StandardHooks,
};
use hookchain_core::{AppError, AppResult};

use crate::api::context::ModuleInit;
use crate::api::handle::PluginHandle;
use crate::hooks::definitions::HookKind;
use crate::hooks::registry::{ChainSummary, HookRegistry};
use crate::modules::{LoadWindow, ModuleEntryFn, ModuleRecord, ModuleState, ModuleTable};
use crate::rewriter::pipeline::RewriterChain;

/// Per-process composition state.
///
/// Implements [`Executor`]: each entry point calls the newest installed
/// handler, or the host's standard implementation when nothing is installed.
pub struct Session {
    host: Rc<dyn StandardHooks>,
    config: AppConfig,
    window: Rc<LoadWindow>,
    registry: Rc<HookRegistry>,
    rewriters: Rc<RewriterChain>,
    modules: RefCell<ModuleTable>,
    memory: Rc<MemoryContext>,
    run_depth: Cell<usize>,
    rows_started: Cell<bool>,
}

impl Session {
    /// Creates a session over `host` with nothing loaded.
    pub fn new(host: Rc<dyn StandardHooks>, config: AppConfig) -> Self {
        let window = Rc::new(LoadWindow::default());
        let memory = MemoryContext::with_limit("hookchain scratch", config.memory.scratch_limit_bytes);
        Self {
            host,
            registry: Rc::new(HookRegistry::new(Rc::clone(&window))),
            window,
            rewriters: Rc::new(RewriterChain::default()),
            modules: RefCell::new(ModuleTable::default()),
            memory: Rc::new(memory),
            run_depth: Cell::new(0),
            rows_started: Cell::new(false),
            config,
        }
    }

    /// The host's standard entry points.
    pub fn host(&self) -> &dyn StandardHooks {
        self.host.as_ref()
    }

    /// Session configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The extension-point registry.
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// The registered row-transform stages.
    pub fn rewriters(&self) -> &RewriterChain {
        &self.rewriters
    }

    /// Scratch context stages allocate replacement values from.
    pub fn memory(&self) -> &Rc<MemoryContext> {
        &self.memory
    }

    /// Current nesting depth of executor run.
    pub fn run_depth(&self) -> usize {
        self.run_depth.get()
    }

    /// Whether the pipeline should interpose at the current depth.
    pub fn pipeline_applies(&self) -> bool {
        match self.config.pipeline.nested {
            NestedPolicy::EveryLevel => true,
            NestedPolicy::Outermost => self.run_depth.get() <= 1,
        }
    }

    // ── Load bracket ──

    /// Opens the load window for `name` and returns its handle.
    ///
    /// Fails when another module's window is open, when rows have already
    /// been produced in this session, or when `name` was loaded before.
    pub fn begin_module_load(&self, name: &str) -> AppResult<PluginHandle> {
        if let Some(open) = self.window.current() {
            return Err(AppError::lifecycle(format!(
                "Cannot load '{name}' while '{open}' is still loading"
            )));
        }
        if self.rows_started.get() {
            return Err(AppError::lifecycle(format!(
                "Cannot load '{name}' after query execution has begun"
            )));
        }
        let mut modules = self.modules.borrow_mut();
        if modules.contains(name) {
            return Err(AppError::lifecycle(format!("Module '{name}' is already loaded")));
        }

        let record = modules.begin(name);
        debug!(module = %name, order = record.order, "Module load window opened");

        let module: Rc<str> = Rc::from(name);
        self.window.open(Rc::clone(&module));
        Ok(PluginHandle::new(
            module,
            Rc::clone(&self.window),
            Rc::clone(&self.registry),
            Rc::clone(&self.rewriters),
        ))
    }

    /// Closes the open load window, validating what the module registered.
    pub fn end_module_load(&self) -> AppResult<ModuleRecord> {
        let module = self
            .window
            .close()
            .ok_or_else(|| AppError::lifecycle("No module load window is open"))?;

        let validation = self.registry.validate(&module);
        let state = if validation.is_ok() {
            ModuleState::Loaded
        } else {
            ModuleState::Failed
        };
        let record = self.finish_record(&module, state)?;
        validation?;

        info!(
            module = %record.name,
            order = record.order,
            hooks = record.hooks.len(),
            rewriters = record.rewriters,
            "Module loaded"
        );
        Ok(record)
    }

    /// Runs `init` inside a load window for `name`.
    ///
    /// An init failure closes the window and marks the module failed; what it
    /// registered before failing stays registered.
    pub fn load_module<F>(&self, name: &str, init: F) -> AppResult<ModuleRecord>
    where
        F: FnOnce(&mut ModuleInit<'_>) -> AppResult<()>,
    {
        let handle = self.begin_module_load(name)?;
        let mut cx = ModuleInit::new(&handle, &self.registry, &self.config);

        if let Err(e) = init(&mut cx) {
            error!(module = %name, error = %e, "Module init failed");
            if let Some(module) = self.window.close() {
                self.finish_record(&module, ModuleState::Failed)?;
            }
            return Err(e);
        }

        self.end_module_load()
    }

    /// Loads every enabled module from the configured preload list, in order.
    ///
    /// Stops at the first module that cannot be resolved or fails to load.
    pub fn preload<R>(&self, mut resolve: R) -> AppResult<Vec<ModuleRecord>>
    where
        R: FnMut(&str) -> AppResult<ModuleEntryFn>,
    {
        self.config
            .enabled_modules()
            .iter()
            .map(|name| {
                let entry = resolve(name)?;
                entry(self)
            })
            .collect()
    }

    fn finish_record(&self, module: &str, state: ModuleState) -> AppResult<ModuleRecord> {
        let hooks = self.registry.touched_by(module);
        let rewriters = self.rewriters.count_for(module);
        let mut modules = self.modules.borrow_mut();
        let record = modules.loading_mut(module).ok_or_else(|| {
            AppError::internal(format!("No load record for module '{module}'"))
        })?;
        record.state = state;
        record.hooks = hooks;
        record.rewriters = rewriters;
        Ok(record.clone())
    }

    // ── Introspection ──

    /// Loaded modules in load order.
    pub fn modules(&self) -> Ref<'_, [ModuleRecord]> {
        Ref::map(self.modules.borrow(), |table| table.records())
    }

    /// Per extension point, the installing modules outermost first.
    pub fn hook_chains(&self) -> Vec<ChainSummary> {
        self.registry.summaries()
    }

    fn trace_dispatch(&self, hook: HookKind, head: Option<Rc<str>>) {
        if self.config.session.trace_dispatch {
            debug!(
                hook = %hook,
                head = head.as_deref().unwrap_or("standard"),
                depth = self.run_depth.get(),
                "Dispatching"
            );
        }
    }
}

impl Executor for Session {
    fn planner(&self, query: &Query, params: &ParamList) -> AppResult<PlannedStmt> {
        let point = self.registry.planner();
        self.trace_dispatch(HookKind::Planner, point.head_module());
        match point.current() {
            Some(handler) => handler(self, query, params),
            None => self.host.standard_planner(self, query, params),
        }
    }

    fn executor_start(&self, qd: &mut QueryDesc, flags: ExecFlags) -> AppResult<()> {
        let point = self.registry.executor_start();
        self.trace_dispatch(HookKind::ExecutorStart, point.head_module());
        match point.current() {
            Some(handler) => handler(self, qd, flags),
            None => self.host.standard_executor_start(self, qd, flags),
        }
    }

    fn executor_run(
        &self,
        qd: &mut QueryDesc,
        direction: ScanDirection,
        count: u64,
        execute_once: bool,
    ) -> AppResult<()> {
        self.rows_started.set(true);
        let _depth = DepthGuard::enter(&self.run_depth);

        let point = self.registry.executor_run();
        self.trace_dispatch(HookKind::ExecutorRun, point.head_module());
        match point.current() {
            Some(handler) => handler(self, qd, direction, count, execute_once),
            None => self
                .host
                .standard_executor_run(self, qd, direction, count, execute_once),
        }
    }

    fn executor_finish(&self, qd: &mut QueryDesc) -> AppResult<()> {
        let point = self.registry.executor_finish();
        self.trace_dispatch(HookKind::ExecutorFinish, point.head_module());
        match point.current() {
            Some(handler) => handler(self, qd),
            None => self.host.standard_executor_finish(self, qd),
        }
    }

    fn executor_end(&self, qd: &mut QueryDesc) -> AppResult<()> {
        let point = self.registry.executor_end();
        self.trace_dispatch(HookKind::ExecutorEnd, point.head_module());
        match point.current() {
            Some(handler) => handler(self, qd),
            None => self.host.standard_executor_end(self, qd),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("modules", &self.modules.borrow().records().len())
            .field("rewriters", &self.rewriters.len())
            .field("run_depth", &self.run_depth.get())
            .finish()
    }
}

/// Increments the executor run depth for the lifetime of the guard.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
