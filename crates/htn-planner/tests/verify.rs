// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Goal verification: a method whose actions all succeed but leave the goal
//! false must be rejected.

use std::sync::Arc;

use htn_dry_tests::light;
use htn_planner::{Call, Node, NodeKind, Planner};

#[test]
fn verification_rejects_self_defeating_method() {
    let mut planner = Planner::new(Arc::new(light::domain(true)));
    let plan = planner
        .plan(&light::init_state(), vec![light::lamp_on().into()])
        .unwrap();
    assert_eq!(plan, vec![Call::new("a_switch_on", ["lamp"])]);

    let goal = planner.tree().children(htn_planner::NodeId::ROOT)[0];
    let kinds: Vec<NodeKind> = planner
        .tree()
        .children(goal)
        .iter()
        .filter_map(|id| planner.tree().node(*id).map(Node::kind))
        .collect();
    assert_eq!(kinds, vec![NodeKind::Action, NodeKind::VerifyGoal]);
    let selected = planner
        .tree()
        .node(goal)
        .and_then(Node::decomposition)
        .and_then(|d| d.selected_method());
    assert_eq!(selected, Some("m_switch"));
}

#[test]
fn without_an_alternative_the_goal_is_unachievable() {
    let mut planner = Planner::new(Arc::new(light::domain(false)));
    let plan = planner
        .plan(&light::init_state(), vec![light::lamp_on().into()])
        .unwrap();
    assert!(plan.is_empty());
}

#[test]
fn goal_that_already_holds_is_skipped() {
    let mut planner = Planner::new(Arc::new(light::domain(false)));
    let lit = light::init_state().with("light", "lamp", true);
    let plan = planner.plan(&lit, vec![light::lamp_on().into()]).unwrap();
    assert!(plan.is_empty());
    let goal = planner.tree().children(htn_planner::NodeId::ROOT)[0];
    assert!(planner.tree().children(goal).is_empty());
}
