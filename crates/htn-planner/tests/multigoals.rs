// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Multigoals: stock splitting under a custom tag, and verification of the
//! default-tag methods.

use std::sync::Arc;

use htn_planner::{
    split_multigoal, Action, Call, Domain, Method, MultiGoal, MultiGoalMethod, Node, NodeKind,
    Planner, State, Todo, Value,
};

fn a_move(mut state: State, args: &[Value]) -> Option<State> {
    let [who, to] = args else { return None };
    state.set("loc", who.clone(), to.clone());
    Some(state)
}

fn gm_move(_: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [who, to] = args else { return None };
    Some(vec![Call::new("a_move", [who.clone(), to.clone()]).into()])
}

fn domain() -> Arc<Domain> {
    let mut domain = Domain::new();
    domain
        .declare_actions(vec![Action::new("a_move", a_move)])
        .declare_goal_methods("loc", vec![Method::new("gm_move", gm_move)])
        .declare_multigoal_methods(
            Some("split"),
            vec![MultiGoalMethod::new("split_multigoal", split_multigoal)],
        );
    Arc::new(domain)
}

fn start() -> State {
    State::new("s")
        .with("loc", "c0", "room0")
        .with("loc", "c1", "room1")
        .with("loc", "c2", "room2")
}

#[test]
fn split_achieves_each_unachieved_binding_in_order() {
    let mut planner = Planner::new(domain());
    let goal = MultiGoal::tagged("g", "split")
        .with("loc", "c0", "room0")
        .with("loc", "c1", "room3")
        .with("loc", "c2", "room4");
    let plan = planner.plan(&start(), vec![goal.clone().into()]).unwrap();
    assert_eq!(
        plan,
        vec![
            Call::new("a_move", ["c1", "room3"]),
            Call::new("a_move", ["c2", "room4"]),
        ]
    );
    assert!(goal.is_achieved(planner.state()));

    let top = planner.tree().children(htn_planner::NodeId::ROOT)[0];
    let last = *planner.tree().children(top).last().unwrap();
    assert_eq!(
        planner.tree().node(last).map(Node::kind),
        Some(NodeKind::VerifyMultiGoal)
    );
}

#[test]
fn default_tag_without_methods_cannot_refine() {
    let mut planner = Planner::new(domain());
    let goal = MultiGoal::new("g").with("loc", "c1", "room3");
    let plan = planner.plan(&start(), vec![goal.into()]).unwrap();
    assert!(plan.is_empty());
}

fn a_lamp(mut state: State, args: &[Value]) -> Option<State> {
    let [lamp, lit] = args else { return None };
    state.set("lit", lamp.clone(), lit.clone());
    Some(state)
}

fn lamp_calls(goal: &MultiGoal, switches: &[bool]) -> Option<Vec<Todo>> {
    let lamp = goal.group("lit")?.keys().next()?.clone();
    Some(
        switches
            .iter()
            .map(|on| Call::new("a_lamp", [lamp.clone(), Value::Bool(*on)]).into())
            .collect(),
    )
}

fn mgm_flicker(_: &State, goal: &MultiGoal) -> Option<Vec<Todo>> {
    lamp_calls(goal, &[true, false])
}

fn mgm_switch_on(_: &State, goal: &MultiGoal) -> Option<Vec<Todo>> {
    lamp_calls(goal, &[true])
}

#[test]
fn failed_multigoal_verification_moves_to_the_next_method() {
    let mut domain = Domain::new();
    domain
        .declare_actions(vec![Action::new("a_lamp", a_lamp)])
        .declare_multigoal_methods(
            None,
            vec![
                MultiGoalMethod::new("mgm_flicker", mgm_flicker),
                MultiGoalMethod::new("mgm_switch_on", mgm_switch_on),
            ],
        );
    let mut planner = Planner::new(Arc::new(domain));
    let dark = State::new("dark").with("lit", "lamp", false);
    let goal = MultiGoal::new("lamp_on").with("lit", "lamp", true);

    let plan = planner.plan(&dark, vec![goal.clone().into()]).unwrap();
    assert_eq!(plan, vec![Call::new("a_lamp", [Value::from("lamp"), Value::Bool(true)])]);
    assert!(goal.is_achieved(planner.state()));

    let top = planner.tree().children(htn_planner::NodeId::ROOT)[0];
    let node = planner.tree().node(top).unwrap();
    assert_eq!(node.kind(), NodeKind::MultiGoal);
    let dec = node.decomposition().unwrap();
    assert_eq!(dec.selected_method(), Some("mgm_switch_on"));
    assert_eq!(dec.cursor(), 2);
    let kinds: Vec<NodeKind> = node
        .children()
        .iter()
        .filter_map(|id| planner.tree().node(*id).map(Node::kind))
        .collect();
    assert_eq!(kinds, vec![NodeKind::Action, NodeKind::VerifyMultiGoal]);
}
