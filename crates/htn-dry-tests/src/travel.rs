// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Task-based simple travel: walk short distances, otherwise take a taxi.
//!
//! Money is in cents. A ride costs `150 + 50 * distance`.

use htn_planner::{Action, Call, Domain, Method, State, Todo, Value};

const PEOPLE: [&str; 2] = ["alice", "bob"];
const LOCATIONS: [&str; 5] = ["home_a", "home_b", "park", "station", "downtown"];
const TAXIS: [&str; 2] = ["taxi1", "taxi2"];
const DISTANCES: [(&str, &str, i64); 7] = [
    ("home_a", "park", 8),
    ("home_b", "park", 2),
    ("station", "home_a", 1),
    ("station", "home_b", 7),
    ("downtown", "home_a", 3),
    ("downtown", "home_b", 7),
    ("station", "downtown", 2),
];

fn is_in(v: &Value, set: &[&str]) -> bool {
    v.as_str().is_some_and(|s| set.contains(&s))
}

fn person(v: &Value) -> bool {
    is_in(v, &PEOPLE)
}

fn location(v: &Value) -> bool {
    is_in(v, &LOCATIONS)
}

fn taxi(v: &Value) -> bool {
    is_in(v, &TAXIS)
}

/// Symmetric distance between two locations.
pub fn distance(x: &Value, y: &Value) -> Option<i64> {
    let (x, y) = (x.as_str()?, y.as_str()?);
    DISTANCES
        .iter()
        .find(|(a, b, _)| (*a == x && *b == y) || (*a == y && *b == x))
        .map(|(_, _, d)| *d)
}

/// Fare in cents for a ride of `dist`.
pub fn taxi_rate(dist: i64) -> i64 {
    150 + 50 * dist
}

fn int(state: &State, var: &str, key: &Value) -> Option<i64> {
    state.get(var, key).and_then(Value::as_int)
}

/// `p` walks from `x` to `y`.
pub fn a_walk(mut state: State, args: &[Value]) -> Option<State> {
    let [p, x, y] = args else { return None };
    if !(person(p) && location(x) && location(y) && x != y) {
        return None;
    }
    if state.get("loc", p) != Some(x) {
        return None;
    }
    state.set("loc", p.clone(), y.clone());
    Some(state)
}

/// Sends `taxi1` to `x` and puts `p` in it.
pub fn a_call_taxi(mut state: State, args: &[Value]) -> Option<State> {
    let [p, x] = args else { return None };
    if !(person(p) && location(x)) {
        return None;
    }
    state.set("loc", "taxi1", x.clone());
    state.set("loc", p.clone(), "taxi1");
    Some(state)
}

/// Drives `p`'s taxi to `y` and records the fare.
pub fn a_ride_taxi(mut state: State, args: &[Value]) -> Option<State> {
    let [p, y] = args else { return None };
    let cab = state.get("loc", p)?.clone();
    if !(person(p) && taxi(&cab) && location(y)) {
        return None;
    }
    let x = state.get("loc", &cab)?.clone();
    if !location(&x) || x == *y {
        return None;
    }
    let fare = taxi_rate(distance(&x, y)?);
    state.set("loc", cab, y.clone());
    state.set("owe", p.clone(), fare);
    Some(state)
}

/// Pays the fare and steps out at `y`.
pub fn a_pay_driver(mut state: State, args: &[Value]) -> Option<State> {
    let [p, y] = args else { return None };
    if !person(p) {
        return None;
    }
    let cash = int(&state, "cash", p)?;
    let owe = int(&state, "owe", p)?;
    if cash < owe {
        return None;
    }
    state.set("cash", p.clone(), cash - owe);
    state.set("owe", p.clone(), 0_i64);
    state.set("loc", p.clone(), y.clone());
    Some(state)
}

/// Already there.
pub fn tm_do_nothing(state: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [p, y] = args else { return None };
    (person(p) && location(y) && state.get("loc", p) == Some(y)).then(Vec::new)
}

/// Walk when the destination is at most two away.
pub fn tm_travel_by_foot(state: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [p, y] = args else { return None };
    if !(person(p) && location(y)) {
        return None;
    }
    let x = state.get("loc", p)?;
    if x == y || distance(x, y)? > 2 {
        return None;
    }
    Some(vec![Call::new("a_walk", [p.clone(), x.clone(), y.clone()]).into()])
}

/// Taxi when `p` can afford the fare.
pub fn tm_travel_by_taxi(state: &State, args: &[Value]) -> Option<Vec<Todo>> {
    let [p, y] = args else { return None };
    if !(person(p) && location(y)) {
        return None;
    }
    let x = state.get("loc", p)?;
    if x == y || int(state, "cash", p)? < taxi_rate(distance(x, y)?) {
        return None;
    }
    Some(vec![
        Call::new("a_call_taxi", [p.clone(), x.clone()]).into(),
        Call::new("a_ride_taxi", [p.clone(), y.clone()]).into(),
        Call::new("a_pay_driver", [p.clone(), y.clone()]).into(),
    ])
}

/// The travel domain.
pub fn domain() -> Domain {
    let mut domain = Domain::new();
    domain
        .declare_actions(vec![
            Action::new("a_walk", a_walk),
            Action::new("a_call_taxi", a_call_taxi),
            Action::new("a_ride_taxi", a_ride_taxi),
            Action::new("a_pay_driver", a_pay_driver),
        ])
        .declare_task_methods(
            "travel",
            vec![
                Method::new("tm_do_nothing", tm_do_nothing),
                Method::new("tm_travel_by_foot", tm_travel_by_foot),
                Method::new("tm_travel_by_taxi", tm_travel_by_taxi),
            ],
        );
    domain
}

/// Alice at home_a, Bob at home_b, both with some cash.
pub fn init_state() -> State {
    State::new("init_state")
        .with("loc", "alice", "home_a")
        .with("loc", "bob", "home_b")
        .with("loc", "taxi1", "park")
        .with("loc", "taxi2", "station")
        .with("cash", "alice", 2000_i64)
        .with("cash", "bob", 1500_i64)
        .with("owe", "alice", 0_i64)
        .with("owe", "bob", 0_i64)
}

/// `travel(p, y)`.
pub fn travel(p: &str, y: &str) -> Todo {
    Call::new("travel", [p, y]).into()
}
