// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Chronological backtracking on the one-flag domain.
//!
//! `put_it` always tries `m_err` first, whose `a_getv(1)` fails after
//! `a_putv(0)`. Whichever `need*` task follows may force a second backtrack
//! into `put_it` or into its own method list.

use std::sync::Arc;

use htn_dry_tests::flags;
use htn_planner::{Node, NodeId, PlanError, Planner, PlannerConfig};

fn plan_for(need: &str) -> Vec<htn_planner::Call> {
    let mut planner = Planner::new(Arc::new(flags::domain()));
    planner
        .plan(&flags::init_state(), flags::problem(need))
        .expect("flag domain is well formed")
}

#[test]
fn need0_backtracks_once_into_put_it() {
    assert_eq!(plan_for("need0"), flags::expected(0));
}

#[test]
fn need01_takes_its_first_method() {
    assert_eq!(plan_for("need01"), flags::expected(0));
}

#[test]
fn need10_backtracks_inside_its_own_methods() {
    assert_eq!(plan_for("need10"), flags::expected(0));
}

#[test]
fn need1_backtracks_across_tasks_into_third_method() {
    assert_eq!(plan_for("need1"), flags::expected(1));
}

#[test]
fn put_it_never_settles_on_m_err() {
    for (need, method, cursor) in [
        ("need0", "m0", 2),
        ("need01", "m0", 2),
        ("need10", "m0", 2),
        ("need1", "m1", 3),
    ] {
        let mut planner = Planner::new(Arc::new(flags::domain()));
        planner
            .plan(&flags::init_state(), flags::problem(need))
            .unwrap();
        let put_it = planner.tree().children(NodeId::ROOT)[0];
        let dec = planner
            .tree()
            .node(put_it)
            .and_then(Node::decomposition)
            .unwrap();
        assert_eq!(dec.selected_method(), Some(method), "need = {need}");
        assert_eq!(dec.cursor(), cursor, "need = {need}");
    }
}

#[test]
fn planner_is_reusable_across_problems() {
    let mut planner = Planner::new(Arc::new(flags::domain()));
    let state = flags::init_state();
    for (need, flag) in [("need1", 1), ("need0", 0), ("need10", 0), ("need1", 1)] {
        let plan = planner.plan(&state, flags::problem(need)).unwrap();
        assert_eq!(plan, flags::expected(flag), "need = {need}");
    }
}

#[test]
fn input_state_is_not_mutated() {
    let mut planner = Planner::new(Arc::new(flags::domain()));
    let state = flags::init_state();
    let before = state.clone();
    planner.plan(&state, flags::problem("need1")).unwrap();
    assert_eq!(state, before);
    assert_ne!(planner.state(), &before);
}

#[test]
fn iteration_cap_stops_the_search() {
    let config = PlannerConfig {
        max_iterations: Some(3),
    };
    let mut planner = Planner::with_config(Arc::new(flags::domain()), config);
    let res = planner.plan(&flags::init_state(), flags::problem("need1"));
    assert_eq!(res, Err(PlanError::IterationLimit(3)));
    assert_eq!(planner.iterations(), 3);
}

#[test]
fn generous_cap_changes_nothing() {
    let config = PlannerConfig {
        max_iterations: Some(10_000),
    };
    let mut planner = Planner::with_config(Arc::new(flags::domain()), config);
    let plan = planner
        .plan(&flags::init_state(), flags::problem("need1"))
        .unwrap();
    assert_eq!(plan, flags::expected(1));
    assert!(planner.iterations() > 0);
}
