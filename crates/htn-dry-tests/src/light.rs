// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A lamp whose first goal method switches it on and straight back off.
//! Every action succeeds, so only goal verification can reject that method.

use htn_planner::{Action, Call, Domain, Method, State, Todo, Value};

/// Turns the lamp on.
pub fn a_switch_on(mut state: State, args: &[Value]) -> Option<State> {
    let [lamp] = args else { return None };
    state.set("light", lamp.clone(), true);
    Some(state)
}

/// Turns the lamp off.
pub fn a_switch_off(mut state: State, args: &[Value]) -> Option<State> {
    let [lamp] = args else { return None };
    state.set("light", lamp.clone(), false);
    Some(state)
}

/// On, then off again.
pub fn m_flicker(_: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [lamp, _] = args else { return None };
    Some(vec![
        Call::new("a_switch_on", [lamp.clone()]).into(),
        Call::new("a_switch_off", [lamp.clone()]).into(),
    ])
}

/// Just on.
pub fn m_switch(_: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [lamp, _] = args else { return None };
    Some(vec![Call::new("a_switch_on", [lamp.clone()]).into()])
}

/// Goal methods for `light`: `m_flicker`, then `m_switch` when `fallback`.
pub fn domain(fallback: bool) -> Domain {
    let mut methods = vec![Method::new("m_flicker", m_flicker)];
    if fallback {
        methods.push(Method::new("m_switch", m_switch));
    }
    let mut domain = Domain::new();
    domain
        .declare_actions(vec![
            Action::new("a_switch_on", a_switch_on),
            Action::new("a_switch_off", a_switch_off),
        ])
        .declare_goal_methods("light", methods);
    domain
}

/// The lamp is off.
pub fn init_state() -> State {
    State::new("dark").with("light", "lamp", false)
}

/// `light[lamp] = true`.
pub fn lamp_on() -> Call {
    Call::goal("light", "lamp", true)
}
