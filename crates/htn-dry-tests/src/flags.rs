// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One-flag domain whose first `put_it` method always dooms its own
//! `a_getv`, so every problem needs at least one backtrack.

use htn_planner::{Action, Call, Domain, Method, State, Todo, Value};

fn flag_key() -> Value {
    Value::Int(0)
}

/// Sets the flag to the argument.
pub fn a_putv(mut state: State, args: &[Value]) -> Option<State> {
    let [v] = args else { return None };
    state.set("flag", flag_key(), v.clone());
    Some(state)
}

/// Succeeds only when the flag equals the argument.
pub fn a_getv(state: State, args: &[Value]) -> Option<State> {
    let [v] = args else { return None };
    state.holds("flag", &flag_key(), v).then_some(state)
}

fn put_then_get(put: i64, get: i64) -> Vec<Todo> {
    vec![
        Call::new("a_putv", [put]).into(),
        Call::new("a_getv", [get]).into(),
    ]
}

/// Writes 0 and then expects 1; never works.
pub fn m_err(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
    Some(put_then_get(0, 1))
}

/// Writes and reads 0.
pub fn m0(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
    Some(put_then_get(0, 0))
}

/// Writes and reads 1.
pub fn m1(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
    Some(put_then_get(1, 1))
}

/// Expects the flag to be 0.
pub fn m_need0(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
    Some(vec![Call::new("a_getv", [0_i64]).into()])
}

/// Expects the flag to be 1.
pub fn m_need1(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
    Some(vec![Call::new("a_getv", [1_i64]).into()])
}

/// `put_it` plus the four `need*` tasks.
pub fn domain() -> Domain {
    let need0 = Method::new("m_need0", m_need0);
    let need1 = Method::new("m_need1", m_need1);
    let mut domain = Domain::new();
    domain
        .declare_actions(vec![
            Action::new("a_putv", a_putv),
            Action::new("a_getv", a_getv),
        ])
        .declare_task_methods(
            "put_it",
            vec![
                Method::new("m_err", m_err),
                Method::new("m0", m0),
                Method::new("m1", m1),
            ],
        )
        .declare_task_methods("need0", vec![need0])
        .declare_task_methods("need1", vec![need1])
        .declare_task_methods("need01", vec![need0, need1])
        .declare_task_methods("need10", vec![need1, need0]);
    domain
}

/// Flag starts at -1.
pub fn init_state() -> State {
    State::new("init_state").with("flag", flag_key(), -1_i64)
}

/// `[put_it, need]`.
pub fn problem(need: &str) -> Vec<Todo> {
    vec![Call::bare("put_it").into(), Call::bare(need).into()]
}

/// The plan expected when the flag ends up at `v`.
pub fn expected(v: i64) -> Vec<Call> {
    vec![
        Call::new("a_putv", [v]),
        Call::new("a_getv", [v]),
        Call::new("a_getv", [v]),
    ]
}
