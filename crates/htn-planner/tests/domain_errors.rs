// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Misconfigured domains are errors, not empty plans.

use std::sync::Arc;

use htn_planner::{
    Action, Call, Domain, Method, MultiGoal, PlanError, Planner, State, Todo, Value,
};

fn step(state: State, _: &[Value]) -> Option<State> {
    Some(state)
}

fn calls_missing(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
    Some(vec![Call::bare("teleport").into()])
}

fn domain() -> Arc<Domain> {
    let mut domain = Domain::new();
    domain
        .declare_actions(vec![Action::new("a_step", step)])
        .declare_task_methods("broken", vec![Method::new("calls_missing", calls_missing)])
        .declare_goal_methods("loc", vec![]);
    Arc::new(domain)
}

#[test]
fn unknown_top_level_name() {
    let mut planner = Planner::new(domain());
    let res = planner.plan(&State::new("s"), vec![Call::bare("fly").into()]);
    assert_eq!(res, Err(PlanError::UnknownTodo("fly".into())));
}

#[test]
fn unknown_name_returned_by_a_method() {
    let mut planner = Planner::new(domain());
    let res = planner.plan(&State::new("s"), vec![Call::bare("broken").into()]);
    assert_eq!(res, Err(PlanError::UnknownTodo("teleport".into())));
}

#[test]
fn undeclared_multigoal_tag() {
    let mut planner = Planner::new(domain());
    let goal = MultiGoal::tagged("g", "logistics").with("loc", "truck", "depot");
    let res = planner.plan(&State::new("s"), vec![goal.into()]);
    assert_eq!(res, Err(PlanError::UnknownMultiGoalTag(Some("logistics".into()))));
}

#[test]
fn goal_without_key_and_value() {
    let mut planner = Planner::new(domain());
    let bad = Call::new("loc", ["truck"]);
    let res = planner.plan(&State::new("s"), vec![bad.clone().into()]);
    assert_eq!(res, Err(PlanError::MalformedGoal(bad)));
}

#[test]
fn empty_task_list_is_an_empty_plan() {
    let mut planner = Planner::new(domain());
    assert_eq!(planner.plan(&State::new("s"), Vec::new()), Ok(Vec::new()));
}

#[test]
fn errors_render_readably() {
    let err = PlanError::ActionRejected {
        index: 2,
        action: Call::new("a_step", [1_i64]),
    };
    assert_eq!(err.to_string(), "action (a_step, 1) rejected at plan index 2");
}
