// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Goal-based blocks world.
//!
//! State variables:
//! - `pos[b]`: `"table"`, `"hand"`, or the block `b` sits on.
//! - `clear[b]`: `false` when something is on `b` or `b` is held.
//! - `holding["hand"]`: the held block, or `false`.
//!
//! Goals on `pos` are resolved by goal methods; whole configurations are
//! multigoals resolved by [`mgm_move_blocks`] under the default tag.

use htn_planner::{Action, Call, Domain, Method, MultiGoal, MultiGoalMethod, State, Todo, Value};

const TABLE: &str = "table";
const HAND: &str = "hand";

fn clear(state: &State, block: &Value) -> bool {
    state.get("clear", block).and_then(Value::as_bool) == Some(true)
}

fn hand_empty(state: &State) -> bool {
    state.get("holding", &Value::from(HAND)).and_then(Value::as_bool) == Some(false)
}

fn pos<'a>(state: &'a State, block: &Value) -> Option<&'a Value> {
    state.get("pos", block)
}

/// A block is done when it and everything below it already sit where the
/// goal wants them (blocks the goal does not mention count as placed).
pub fn is_done(block: &Value, state: &State, goal: &MultiGoal) -> bool {
    if *block == TABLE {
        return true;
    }
    let here = pos(state, block);
    if let Some(want) = goal.get("pos", block) {
        if here != Some(want) {
            return false;
        }
    }
    match here {
        Some(below) if *below == TABLE => true,
        Some(below) => is_done(below, state, goal),
        None => false,
    }
}

/// Classification of a block with respect to a goal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// Already in its final position.
    Done,
    /// Something is on top of it.
    Inaccessible,
    /// Clear, and belongs on the table (or nowhere in particular).
    MoveToTable,
    /// Clear, and its destination is finished and clear.
    MoveToBlock,
    /// Clear, but its destination is not ready yet.
    Waiting,
}

/// Classifies `block` for the block-stacking algorithm.
pub fn status(block: &Value, state: &State, goal: &MultiGoal) -> BlockStatus {
    if is_done(block, state, goal) {
        return BlockStatus::Done;
    }
    if !clear(state, block) {
        return BlockStatus::Inaccessible;
    }
    match goal.get("pos", block) {
        None => BlockStatus::MoveToTable,
        Some(target) if *target == TABLE => BlockStatus::MoveToTable,
        Some(target) if is_done(target, state, goal) && clear(state, target) => {
            BlockStatus::MoveToBlock
        }
        Some(_) => BlockStatus::Waiting,
    }
}

fn clear_blocks(state: &State) -> Vec<Value> {
    state
        .group("clear")
        .map(|group| {
            group
                .iter()
                .filter(|(_, v)| v.as_bool() == Some(true))
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Moves one clear block toward its final position and re-posts the
/// multigoal; returns no subtasks once nothing needs moving.
pub fn mgm_move_blocks(state: &State, goal: &MultiGoal) -> Option<Vec<Todo>> {
    let blocks = clear_blocks(state);
    for block in &blocks {
        match status(block, state, goal) {
            BlockStatus::MoveToBlock => {
                let target = goal.get("pos", block)?.clone();
                return Some(vec![
                    Call::goal("pos", block.clone(), target).into(),
                    goal.clone().into(),
                ]);
            }
            BlockStatus::MoveToTable => {
                return Some(vec![
                    Call::goal("pos", block.clone(), TABLE).into(),
                    goal.clone().into(),
                ]);
            }
            _ => {}
        }
    }
    if let Some(block) = blocks
        .iter()
        .find(|b| status(b, state, goal) == BlockStatus::Waiting)
    {
        return Some(vec![
            Call::goal("pos", block.clone(), TABLE).into(),
            goal.clone().into(),
        ]);
    }
    Some(Vec::new())
}

/// `pos[b1] = b2`: pick `b1` up, then put it on `b2`.
pub fn gm_move1(state: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [b1, b2] = args else { return None };
    if *b2 == HAND || !clear(state, b1) || !hand_empty(state) {
        return None;
    }
    if *b2 != TABLE && !clear(state, b2) {
        return None;
    }
    Some(vec![
        Call::goal("pos", b1.clone(), HAND).into(),
        Call::goal("pos", b1.clone(), b2.clone()).into(),
    ])
}

/// `pos[b1] = "hand"`: pick up or unstack `b1`.
pub fn gm_get(state: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [b1, b2] = args else { return None };
    if *b2 != HAND || !clear(state, b1) || !hand_empty(state) {
        return None;
    }
    let below = pos(state, b1)?;
    if *below == TABLE {
        Some(vec![Call::new("a_pickup", [b1.clone()]).into()])
    } else {
        Some(vec![Call::new("a_unstack", [b1.clone(), below.clone()]).into()])
    }
}

/// `pos[b1] = b2` while holding `b1`: put it down or stack it.
pub fn gm_put(state: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [b1, b2] = args else { return None };
    if *b2 == HAND || pos(state, b1).is_none_or(|p| *p != HAND) {
        return None;
    }
    if *b2 == TABLE {
        Some(vec![Call::new("a_putdown", [b1.clone()]).into()])
    } else if clear(state, b2) {
        Some(vec![Call::new("a_stack", [b1.clone(), b2.clone()]).into()])
    } else {
        None
    }
}

fn grab(state: &mut State, b: &Value) {
    state.set("pos", b.clone(), HAND);
    state.set("clear", b.clone(), false);
    state.set("holding", HAND, b.clone());
}

/// Picks `b` up from the table.
pub fn a_pickup(mut state: State, args: &[Value]) -> Option<State> {
    let [b] = args else { return None };
    let on_table = pos(&state, b).is_some_and(|p| *p == TABLE);
    if !(on_table && clear(&state, b) && hand_empty(&state)) {
        return None;
    }
    grab(&mut state, b);
    Some(state)
}

/// Lifts `b` off `c`.
pub fn a_unstack(mut state: State, args: &[Value]) -> Option<State> {
    let [b, c] = args else { return None };
    let on_c = pos(&state, b) == Some(c);
    if !(on_c && *c != TABLE && clear(&state, b) && hand_empty(&state)) {
        return None;
    }
    grab(&mut state, b);
    state.set("clear", c.clone(), true);
    Some(state)
}

/// Puts the held block `b` on the table.
pub fn a_putdown(mut state: State, args: &[Value]) -> Option<State> {
    let [b] = args else { return None };
    if pos(&state, b).is_none_or(|p| *p != HAND) {
        return None;
    }
    state.set("pos", b.clone(), TABLE);
    state.set("clear", b.clone(), true);
    state.set("holding", HAND, false);
    Some(state)
}

/// Stacks the held block `b` on `c`.
pub fn a_stack(mut state: State, args: &[Value]) -> Option<State> {
    let [b, c] = args else { return None };
    if pos(&state, b).is_none_or(|p| *p != HAND) || !clear(&state, c) {
        return None;
    }
    state.set("pos", b.clone(), c.clone());
    state.set("clear", b.clone(), true);
    state.set("holding", HAND, false);
    state.set("clear", c.clone(), false);
    Some(state)
}

/// The goal-based blocks world domain.
pub fn domain() -> Domain {
    let mut domain = Domain::new();
    domain
        .declare_actions(vec![
            Action::new("a_pickup", a_pickup),
            Action::new("a_unstack", a_unstack),
            Action::new("a_putdown", a_putdown),
            Action::new("a_stack", a_stack),
        ])
        .declare_goal_methods(
            "pos",
            vec![
                Method::new("gm_move1", gm_move1),
                Method::new("gm_get", gm_get),
                Method::new("gm_put", gm_put),
            ],
        )
        .declare_multigoal_methods(
            None,
            vec![MultiGoalMethod::new("mgm_move_blocks", mgm_move_blocks)],
        );
    domain
}

/// `a` on `b`; `b` and `c` on the table.
pub fn init_state_1() -> State {
    State::new("init_state_1")
        .with("pos", "a", "b")
        .with("pos", "b", TABLE)
        .with("pos", "c", TABLE)
        .with("clear", "c", true)
        .with("clear", "b", false)
        .with("clear", "a", true)
        .with("holding", HAND, false)
}

/// Tower `a`-`b`-`c` from the table up, fully specified.
pub fn goal1a() -> MultiGoal {
    MultiGoal::new("goal1a")
        .with("pos", "c", "b")
        .with("pos", "b", "a")
        .with("pos", "a", TABLE)
        .with("clear", "c", true)
        .with("clear", "b", false)
        .with("clear", "a", false)
        .with("holding", HAND, false)
}

/// The same tower, stated only by the two stacking relations.
pub fn goal1b() -> MultiGoal {
    MultiGoal::new("goal1b")
        .with("pos", "c", "b")
        .with("pos", "b", "a")
}

/// `a` on `c`, `b` on `d`.
pub fn init_state_2() -> State {
    State::new("init_state_2")
        .with("pos", "a", "c")
        .with("pos", "b", "d")
        .with("pos", "c", TABLE)
        .with("pos", "d", TABLE)
        .with("clear", "a", true)
        .with("clear", "c", false)
        .with("clear", "b", true)
        .with("clear", "d", false)
        .with("holding", HAND, false)
}

/// Swap the two top blocks, fully specified.
pub fn goal2a() -> MultiGoal {
    MultiGoal::new("goal2a")
        .with("pos", "b", "c")
        .with("pos", "a", "d")
        .with("pos", "c", TABLE)
        .with("pos", "d", TABLE)
        .with("clear", "a", true)
        .with("clear", "c", false)
        .with("clear", "b", true)
        .with("clear", "d", false)
        .with("holding", HAND, false)
}

/// Swap the two top blocks, stated only by the stacking relations.
pub fn goal2b() -> MultiGoal {
    MultiGoal::new("goal2b").with("pos", "b", "c").with("pos", "a", "d")
}

/// Nineteen numbered blocks in four towers.
pub fn init_state_3() -> State {
    let on: [(i64, Value); 19] = [
        (1, Value::Int(12)),
        (12, Value::Int(13)),
        (13, TABLE.into()),
        (11, Value::Int(10)),
        (10, Value::Int(5)),
        (5, Value::Int(4)),
        (4, Value::Int(14)),
        (14, Value::Int(15)),
        (15, TABLE.into()),
        (9, Value::Int(8)),
        (8, Value::Int(7)),
        (7, Value::Int(6)),
        (6, TABLE.into()),
        (19, Value::Int(18)),
        (18, Value::Int(17)),
        (17, Value::Int(16)),
        (16, Value::Int(3)),
        (3, Value::Int(2)),
        (2, TABLE.into()),
    ];
    let mut state = State::new("init_state_3").with("holding", HAND, false);
    for (block, below) in on {
        state.set("pos", block, below);
    }
    for block in 1..20_i64 {
        state.set("clear", block, matches!(block, 1 | 9 | 11 | 19));
    }
    state
}

/// Large rearrangement of [`init_state_3`].
pub fn goal3() -> MultiGoal {
    let on: [(i64, Value); 12] = [
        (15, Value::Int(13)),
        (13, Value::Int(8)),
        (8, Value::Int(9)),
        (9, Value::Int(4)),
        (4, TABLE.into()),
        (12, Value::Int(2)),
        (2, Value::Int(3)),
        (3, Value::Int(16)),
        (16, Value::Int(11)),
        (11, Value::Int(7)),
        (7, Value::Int(6)),
        (6, TABLE.into()),
    ];
    let mut goal = MultiGoal::new("goal3");
    for (block, below) in on {
        goal = goal.with("pos", block, below);
    }
    goal.with("clear", 17_i64, true)
        .with("clear", 15_i64, true)
        .with("clear", 12_i64, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classifies_initial_blocks() {
        let state = init_state_1();
        let goal = goal1b();
        assert_eq!(status(&"a".into(), &state, &goal), BlockStatus::MoveToTable);
        assert_eq!(status(&"b".into(), &state, &goal), BlockStatus::Inaccessible);
        assert_eq!(status(&"c".into(), &state, &goal), BlockStatus::Waiting);
    }

    #[test]
    fn actions_respect_preconditions() {
        let state = init_state_1();
        assert!(a_pickup(state.clone(), &["b".into()]).is_none());
        let held = a_unstack(state, &["a".into(), "b".into()]);
        assert!(held
            .as_ref()
            .is_some_and(|s| s.holds("holding", &HAND.into(), &"a".into())));
        let down = held.and_then(|s| a_putdown(s, &["a".into()]));
        assert!(down.is_some_and(|s| s.holds("clear", &"b".into(), &true.into())));
    }
}
