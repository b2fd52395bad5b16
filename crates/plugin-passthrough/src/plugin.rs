//! Pass-through module implementation.

use tracing::{debug, info};

use hookchain_core::AppResult;
use hookchain_plugin::hooks::chain;
use hookchain_plugin::hooks::definitions::{
    executor_end_handler, executor_finish_handler, executor_run_handler, executor_start_handler,
    planner_handler,
};
use hookchain_plugin::{HookKind, Module, ModuleInit};

/// Module that intercepts every entry point, logs the call, and hands it on
/// unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughModule;

fn announce(notice: bool, hook: HookKind, query: &str, depth: usize) {
    if notice {
        info!(hook = %hook, query = %query, depth, "Passing through");
    } else {
        debug!(hook = %hook, query = %query, depth, "Passing through");
    }
}

impl Module for PassthroughModule {
    fn init(&self, cx: &mut ModuleInit<'_>) -> AppResult<()> {
        let notice = cx.config().modules.passthrough.notice;
        let registry = cx.registry();

        registry.planner().install_with(|prev| {
            planner_handler(move |session, query, params| {
                announce(notice, HookKind::Planner, &query.source_text, session.run_depth());
                chain::planner(prev.as_deref(), session, query, params)
            })
        });

        registry.executor_start().install_with(|prev| {
            executor_start_handler(move |session, qd, flags| {
                announce(notice, HookKind::ExecutorStart, &qd.source_text, session.run_depth());
                chain::executor_start(prev.as_deref(), session, qd, flags)
            })
        });

        registry.executor_run().install_with(|prev| {
            executor_run_handler(move |session, qd, direction, count, execute_once| {
                announce(notice, HookKind::ExecutorRun, &qd.source_text, session.run_depth());
                chain::executor_run(prev.as_deref(), session, qd, direction, count, execute_once)
            })
        });

        registry.executor_finish().install_with(|prev| {
            executor_finish_handler(move |session, qd| {
                announce(notice, HookKind::ExecutorFinish, &qd.source_text, session.run_depth());
                chain::executor_finish(prev.as_deref(), session, qd)
            })
        });

        registry.executor_end().install_with(|prev| {
            executor_end_handler(move |session, qd| {
                announce(notice, HookKind::ExecutorEnd, &qd.source_text, session.run_depth());
                chain::executor_end(prev.as_deref(), session, qd)
            })
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use hookchain_core::config::AppConfig;
    use hookchain_core::host::mock::{MockHost, RecordingDest, users_relation};
    use hookchain_core::host::{ParamList, Query, portal};
    use hookchain_plugin::Session;

    use super::*;

    #[test]
    fn test_every_call_reaches_host_default() {
        let host = Rc::new(MockHost::with_sample_catalog());
        let session = Session::new(host.clone(), AppConfig::default());
        crate::module_entry(&session).expect("load");

        let (dest, log) = RecordingDest::new();
        let processed = portal::run_query(
            &session,
            &Query::select(users_relation()),
            ParamList::default(),
            Box::new(dest),
        )
        .expect("run");

        assert_eq!(processed, 3);
        assert_eq!(log.borrow().rows().len(), 3);
        assert_eq!(
            host.standard_calls(),
            vec!["planner", "executor_start", "executor_run", "executor_finish", "executor_end"]
        );
    }

    #[test]
    fn test_installs_on_all_five_points() {
        let session = Session::new(Rc::new(MockHost::new()), AppConfig::default());
        let record = crate::module_entry(&session).expect("load");

        assert_eq!(record.hooks, HookKind::ALL.to_vec());
        for chain in session.hook_chains() {
            assert_eq!(chain.modules, vec![crate::MODULE_NAME.to_string()]);
        }
    }
}
