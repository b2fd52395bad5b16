//! Extension-point registry. Each slot holds the newest handler; installing a
//! handler hands back the one it displaced so the newcomer can chain to it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, warn};

use hookchain_core::{AppError, AppResult};

use super::definitions::{
    ExecutorEndFn, ExecutorFinishFn, ExecutorRunFn, ExecutorStartFn, HookKind, PlannerFn,
};
use crate::modules::LoadWindow;

/// Attribution used for handlers installed while no module is loading.
pub const UNATTRIBUTED: &str = "<unattributed>";

/// One installation on an extension point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    /// Module that installed the handler.
    pub module: Rc<str>,
    /// Identity of the installed handler.
    pub addr: usize,
}

/// Serializable view of one extension point's chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    /// The extension point.
    pub hook: HookKind,
    /// Installing modules, outermost (last installed) first.
    pub modules: Vec<String>,
}

/// Read-only view over an extension point, independent of its handler type.
pub trait ChainInfo {
    /// Which extension point this is.
    fn kind(&self) -> HookKind;

    /// Installations in the order they happened.
    fn links(&self) -> Vec<ChainLink>;
}

/// One interceptable slot.
///
/// The chain `current -> previous -> ... -> host default` is formed by each
/// handler capturing what `install` returned. The slot keeps no per-call
/// state: callers clone the current handler out before invoking it, so a
/// handler may re-enter the same entry point freely.
pub struct ExtensionPoint<F: ?Sized> {
    kind: HookKind,
    current: RefCell<Option<Rc<F>>>,
    previous: RefCell<Option<Rc<F>>>,
    links: RefCell<Vec<ChainLink>>,
    // Keeps every installed handler alive so link addresses stay unique.
    retained: RefCell<Vec<Rc<F>>>,
    window: Rc<LoadWindow>,
}

impl<F: ?Sized> ExtensionPoint<F> {
    pub(crate) fn new(kind: HookKind, window: Rc<LoadWindow>) -> Self {
        Self {
            kind,
            current: RefCell::new(None),
            previous: RefCell::new(None),
            links: RefCell::new(Vec::new()),
            retained: RefCell::new(Vec::new()),
            window,
        }
    }

    /// Which extension point this is.
    pub fn kind(&self) -> HookKind {
        self.kind
    }

    /// Installs `handler`, returning the handler it displaced.
    ///
    /// `None` means the slot was empty and the new handler must fall back to
    /// the host's standard implementation. The installation is attributed to
    /// the module currently inside its load window.
    pub fn install(&self, handler: Rc<F>) -> Option<Rc<F>> {
        let module = self.window.current().unwrap_or_else(|| {
            warn!(hook = %self.kind, "Handler installed outside a module load window");
            Rc::from(UNATTRIBUTED)
        });
        self.install_as(module, handler)
    }

    /// Builds a handler from the one it is about to displace and installs it.
    pub fn install_with(&self, build: impl FnOnce(Option<Rc<F>>) -> Rc<F>) {
        let handler = build(self.current());
        self.install(handler);
    }

    pub(crate) fn install_as(&self, module: Rc<str>, handler: Rc<F>) -> Option<Rc<F>> {
        let addr = Rc::as_ptr(&handler).cast::<()>() as usize;
        self.retained.borrow_mut().push(Rc::clone(&handler));
        let displaced = self.current.replace(Some(handler));
        *self.previous.borrow_mut() = displaced.clone();

        let mut links = self.links.borrow_mut();
        links.push(ChainLink {
            module: Rc::clone(&module),
            addr,
        });
        debug!(
            hook = %self.kind,
            module = %module,
            chain_len = links.len(),
            "Handler installed"
        );

        displaced
    }

    /// The newest handler, if any.
    pub fn current(&self) -> Option<Rc<F>> {
        self.current.borrow().clone()
    }

    /// The handler the newest one displaced, if any.
    pub fn previous(&self) -> Option<Rc<F>> {
        self.previous.borrow().clone()
    }

    /// The module that installed the newest handler.
    pub fn head_module(&self) -> Option<Rc<str>> {
        self.links.borrow().last().map(|link| Rc::clone(&link.module))
    }
}

impl<F: ?Sized> ChainInfo for ExtensionPoint<F> {
    fn kind(&self) -> HookKind {
        self.kind
    }

    fn links(&self) -> Vec<ChainLink> {
        self.links.borrow().clone()
    }
}

impl<F: ?Sized> fmt::Debug for ExtensionPoint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionPoint")
            .field("kind", &self.kind)
            .field("installed", &self.current.borrow().is_some())
            .field("links", &self.links.borrow().len())
            .finish()
    }
}

/// The five extension points of one host process.
#[derive(Debug)]
pub struct HookRegistry {
    planner: ExtensionPoint<PlannerFn>,
    executor_start: ExtensionPoint<ExecutorStartFn>,
    executor_run: ExtensionPoint<ExecutorRunFn>,
    executor_finish: ExtensionPoint<ExecutorFinishFn>,
    executor_end: ExtensionPoint<ExecutorEndFn>,
}

impl HookRegistry {
    /// Creates a registry with every slot empty.
    pub fn new(window: Rc<LoadWindow>) -> Self {
        Self {
            planner: ExtensionPoint::new(HookKind::Planner, Rc::clone(&window)),
            executor_start: ExtensionPoint::new(HookKind::ExecutorStart, Rc::clone(&window)),
            executor_run: ExtensionPoint::new(HookKind::ExecutorRun, Rc::clone(&window)),
            executor_finish: ExtensionPoint::new(HookKind::ExecutorFinish, Rc::clone(&window)),
            executor_end: ExtensionPoint::new(HookKind::ExecutorEnd, window),
        }
    }

    /// Planner slot.
    pub fn planner(&self) -> &ExtensionPoint<PlannerFn> {
        &self.planner
    }

    /// Executor start slot.
    pub fn executor_start(&self) -> &ExtensionPoint<ExecutorStartFn> {
        &self.executor_start
    }

    /// Executor run slot.
    pub fn executor_run(&self) -> &ExtensionPoint<ExecutorRunFn> {
        &self.executor_run
    }

    /// Executor finish slot.
    pub fn executor_finish(&self) -> &ExtensionPoint<ExecutorFinishFn> {
        &self.executor_finish
    }

    /// Executor end slot.
    pub fn executor_end(&self) -> &ExtensionPoint<ExecutorEndFn> {
        &self.executor_end
    }

    /// Every slot, in host call order.
    pub fn chains(&self) -> [&dyn ChainInfo; 5] {
        [
            &self.planner,
            &self.executor_start,
            &self.executor_run,
            &self.executor_finish,
            &self.executor_end,
        ]
    }

    /// Per-slot chain listing, outermost handler first.
    pub fn summaries(&self) -> Vec<ChainSummary> {
        self.chains()
            .iter()
            .map(|chain| ChainSummary {
                hook: chain.kind(),
                modules: chain
                    .links()
                    .iter()
                    .rev()
                    .map(|link| link.module.to_string())
                    .collect(),
            })
            .collect()
    }

    /// Slots `module` installed at least one handler on.
    pub fn touched_by(&self, module: &str) -> Vec<HookKind> {
        self.chains()
            .iter()
            .filter(|chain| chain.links().iter().any(|link| &*link.module == module))
            .map(|chain| chain.kind())
            .collect()
    }

    /// Rejects chains in which `module` installed a handler that was
    /// already on the chain.
    ///
    /// Installing the same handler twice makes the second installation
    /// capture itself as its predecessor's successor, so one link is never
    /// reached. Duplicates left by other modules are not reported again.
    pub(crate) fn validate(&self, module: &str) -> AppResult<()> {
        for chain in self.chains() {
            let mut seen = HashSet::new();
            for link in chain.links() {
                if !seen.insert(link.addr) && &*link.module == module {
                    return Err(AppError::registration(format!(
                        "Module '{}' installed the same {} handler twice",
                        link.module,
                        chain.kind()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::definitions::executor_end_handler;

    #[test]
    fn test_install_returns_displaced_handler() {
        let registry = HookRegistry::new(Rc::new(LoadWindow::default()));
        let first = executor_end_handler(|_, _| Ok(()));
        let second = executor_end_handler(|_, _| Ok(()));

        assert!(registry.executor_end().install(Rc::clone(&first)).is_none());
        let displaced = registry
            .executor_end()
            .install(Rc::clone(&second))
            .expect("displaced");

        assert!(Rc::ptr_eq(&displaced, &first));
        assert!(Rc::ptr_eq(
            &registry.executor_end().current().expect("current"),
            &second
        ));
        assert!(Rc::ptr_eq(
            &registry.executor_end().previous().expect("previous"),
            &first
        ));
    }

    #[test]
    fn test_unattributed_install() {
        let registry = HookRegistry::new(Rc::new(LoadWindow::default()));
        registry
            .executor_end()
            .install(executor_end_handler(|_, _| Ok(())));
        assert_eq!(
            registry.executor_end().head_module().as_deref(),
            Some(UNATTRIBUTED)
        );
    }

    #[test]
    fn test_duplicate_handler_rejected() {
        let registry = HookRegistry::new(Rc::new(LoadWindow::default()));
        let handler = executor_end_handler(|_, _| Ok(()));
        registry.executor_end().install(Rc::clone(&handler));
        assert!(registry.validate(UNATTRIBUTED).is_ok());
        registry.executor_end().install(handler);
        let err = registry.validate(UNATTRIBUTED).expect_err("duplicate");
        assert_eq!(err.kind, hookchain_core::error::ErrorKind::Registration);
        assert!(registry.validate("other").is_ok());
    }

    #[test]
    fn test_summaries_list_outermost_first() {
        let registry = HookRegistry::new(Rc::new(LoadWindow::default()));
        registry
            .executor_end()
            .install_as(Rc::from("a"), executor_end_handler(|_, _| Ok(())));
        registry
            .executor_end()
            .install_as(Rc::from("b"), executor_end_handler(|_, _| Ok(())));

        let summaries = registry.summaries();
        assert_eq!(summaries.len(), 5);
        let end = summaries
            .iter()
            .find(|s| s.hook == HookKind::ExecutorEnd)
            .expect("executor end");
        assert_eq!(end.modules, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(registry.touched_by("a"), vec![HookKind::ExecutorEnd]);
    }
}
