//! Per-module capability object.

use std::fmt;
use std::rc::Rc;

use tracing::info;

use hookchain_core::{AppError, AppResult};

use crate::hooks::registry::HookRegistry;
use crate::modules::LoadWindow;
use crate::rewriter::pipeline::{PIPELINE_MODULE, RewriterChain, pipeline_handler};
use crate::rewriter::stage::OutputRewriter;

/// Handle returned to a module when its load window opens.
///
/// Every registration made through it is attributed to the module. It is
/// only usable while that module's load window is open.
pub struct PluginHandle {
    module: Rc<str>,
    window: Rc<LoadWindow>,
    registry: Rc<HookRegistry>,
    rewriters: Rc<RewriterChain>,
}

impl PluginHandle {
    pub(crate) fn new(
        module: Rc<str>,
        window: Rc<LoadWindow>,
        registry: Rc<HookRegistry>,
        rewriters: Rc<RewriterChain>,
    ) -> Self {
        Self {
            module,
            window,
            registry,
            rewriters,
        }
    }

    /// Name of the module this handle belongs to.
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Appends a stage to the process's pipeline.
    pub fn register_output_rewriter<R: OutputRewriter + 'static>(&self, rewriter: R) -> AppResult<()> {
        self.register_shared_rewriter(Rc::new(rewriter))
    }

    /// Appends an already shared stage to the process's pipeline.
    ///
    /// The first registration in the process also installs the core's
    /// executor run override; before that no override exists.
    pub fn register_shared_rewriter(&self, rewriter: Rc<dyn OutputRewriter>) -> AppResult<()> {
        if !self.window.is_open_for(&self.module) {
            return Err(AppError::lifecycle(format!(
                "Module '{}' registered an output rewriter outside its load window",
                self.module
            )));
        }

        self.rewriters.push(Rc::clone(&self.module), rewriter);

        if self.rewriters.claim_hook() {
            let run = self.registry.executor_run();
            run.install_as(Rc::from(PIPELINE_MODULE), pipeline_handler(run.current()));
        }

        info!(
            module = %self.module,
            position = self.rewriters.len(),
            "Output rewriter registered"
        );
        Ok(())
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("module", &self.module)
            .finish()
    }
}
