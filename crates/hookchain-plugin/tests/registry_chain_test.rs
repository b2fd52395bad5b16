//! Integration tests for handler chaining across module loads.

mod helpers;

use std::cell::Cell;
use std::rc::Rc;

use hookchain_core::host::Query;
use hookchain_core::host::mock::{notes_relation, users_relation};
use hookchain_plugin::hooks::chain;
use hookchain_plugin::hooks::definitions::{
    executor_run_handler, executor_start_handler, planner_handler,
};
use hookchain_plugin::{HookKind, Session};

use helpers::EventLog;

fn tag_planner(session: &Session, module: &'static str, log: &EventLog) {
    let log = Rc::clone(log);
    session
        .load_module(module, move |cx| {
            cx.registry().planner().install_with(|prev| {
                planner_handler(move |session, query, params| {
                    log.borrow_mut().push(module.to_string());
                    chain::planner(prev.as_deref(), session, query, params)
                })
            });
            Ok(())
        })
        .expect("load");
}

#[test]
fn test_two_modules_run_in_reverse_order_then_default() {
    let (host, session) = helpers::session();
    let log = helpers::event_log();
    tag_planner(&session, "first", &log);
    tag_planner(&session, "second", &log);

    let (result, _) = helpers::run(&session, &Query::select(users_relation()));
    result.expect("run");

    assert_eq!(*log.borrow(), vec!["second".to_string(), "first".to_string()]);
    let planner_calls = host
        .standard_calls()
        .iter()
        .filter(|c| **c == "planner")
        .count();
    assert_eq!(planner_calls, 1);
}

#[test]
fn test_modules_not_touching_a_point_are_skipped() {
    let (host, session) = helpers::session();
    let log = helpers::event_log();

    tag_planner(&session, "a", &log);
    session.load_module("quiet", |_| Ok(())).expect("load");
    let start_log = Rc::clone(&log);
    session
        .load_module("starter", move |cx| {
            cx.registry().executor_start().install_with(|prev| {
                executor_start_handler(move |session, qd, flags| {
                    start_log.borrow_mut().push("starter".to_string());
                    chain::executor_start(prev.as_deref(), session, qd, flags)
                })
            });
            Ok(())
        })
        .expect("load");
    tag_planner(&session, "b", &log);

    helpers::run(&session, &Query::select(users_relation()))
        .0
        .expect("run");

    assert_eq!(
        *log.borrow(),
        vec!["b".to_string(), "a".to_string(), "starter".to_string()]
    );
    let calls = host.standard_calls();
    assert_eq!(calls.iter().filter(|c| **c == "planner").count(), 1);
    assert_eq!(calls.iter().filter(|c| **c == "executor_start").count(), 1);
}

#[test]
fn test_nested_invocation_reenters_chain() {
    let (host, session) = helpers::session();
    let runs = Rc::new(Cell::new(0usize));
    let max_depth = Rc::new(Cell::new(0usize));

    let (r, d) = (Rc::clone(&runs), Rc::clone(&max_depth));
    session
        .load_module("counter", move |cx| {
            cx.registry().executor_run().install_with(|prev| {
                executor_run_handler(move |session, qd, direction, count, once| {
                    r.set(r.get() + 1);
                    d.set(d.get().max(session.run_depth()));
                    chain::executor_run(prev.as_deref(), session, qd, direction, count, once)
                })
            });
            Ok(())
        })
        .expect("load");

    let query = Query::select(users_relation()).with_subquery(Query::select(notes_relation()));
    let (result, log) = helpers::run(&session, &query);
    result.expect("run");

    assert_eq!(runs.get(), 2);
    assert_eq!(max_depth.get(), 2);
    assert_eq!(session.run_depth(), 0);
    assert_eq!(log.borrow().rows().len(), 3);
    let standard_runs = host
        .standard_calls()
        .iter()
        .filter(|c| **c == "executor_run")
        .count();
    assert_eq!(standard_runs, 2);
}

#[test]
fn test_empty_session_uses_host_defaults() {
    let (host, session) = helpers::session();
    let (result, log) = helpers::run(&session, &Query::select(users_relation()));

    assert_eq!(result.expect("run"), 3);
    assert_eq!(log.borrow().rows().len(), 3);
    assert_eq!(host.standard_calls().len(), 5);
    assert!(session.hook_chains().iter().all(|c| c.modules.is_empty()));
}

#[test]
fn test_hook_chains_report_installers() {
    let (_, session) = helpers::session();
    let log = helpers::event_log();
    tag_planner(&session, "first", &log);
    tag_planner(&session, "second", &log);

    let chains = session.hook_chains();
    let planner = chains
        .iter()
        .find(|c| c.hook == HookKind::Planner)
        .expect("planner chain");
    assert_eq!(planner.modules, vec!["second".to_string(), "first".to_string()]);

    let modules = session.modules();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].hooks, vec![HookKind::Planner]);
    assert_eq!(modules[1].order, 2);
}
