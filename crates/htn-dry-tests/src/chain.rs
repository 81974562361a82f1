// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Numbered flag chain.
//!
//! `t_a(i, j)` requires `flag[i]` and sets `flag[j]`. Only `flag[0]` starts
//! true, so a method list fails exactly when it skips a link. Three task
//! tables exercise ordering, exhaustion, and replanning.

use htn_planner::{Action, Call, Domain, Method, State, Todo, Value};

/// Number of flags in [`init_state`].
pub const FLAGS: i64 = 20;

/// Requires `flag[i]`, sets `flag[j]`.
pub fn t_a(mut state: State, args: &[Value]) -> Option<State> {
    let [from, to] = args else { return None };
    if !state.holds("flag", from, &Value::Bool(true)) {
        return None;
    }
    state.set("flag", to.clone(), true);
    Some(state)
}

/// The chain link `(from, to)` as an action call.
pub fn link(from: i64, to: i64) -> Call {
    Call::new("t_a", [from, to])
}

fn links(pairs: &[(i64, i64)]) -> Option<Vec<Todo>> {
    Some(
        pairs
            .iter()
            .map(|&(from, to)| Todo::from(link(from, to)))
            .collect(),
    )
}

fn sub_then(task: &str, pairs: &[(i64, i64)]) -> Option<Vec<Todo>> {
    let mut todo = vec![Call::bare(task).into()];
    todo.extend(links(pairs)?);
    Some(todo)
}

/// `flag[0]` true, `flag[1..20]` false.
pub fn init_state() -> State {
    let mut state = State::new("init_state_1").with("flag", 0_i64, true);
    for i in 1..FLAGS {
        state.set("flag", i, false);
    }
    state
}

fn base() -> Domain {
    let mut domain = Domain::new();
    domain.declare_actions(vec![Action::new("t_a", t_a)]);
    domain
}

mod ordered {
    use super::{links, State, Todo, Value};

    pub fn tm_1_1(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(0, 1), (1, 2), (3, 4)])
    }
    pub fn tm_1_2(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(0, 1), (1, 2), (2, 3)])
    }
    pub fn tm_1_3(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(0, 1), (1, 2), (2, 3), (3, 4)])
    }
    pub fn tm_2_1(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(3, 4), (4, 5), (6, 7)])
    }
    pub fn tm_2_2(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(4, 5), (5, 6), (6, 7)])
    }
}

/// `tm_1` then `tm_2`; both need backtracking, the first inside `tm_1`, the
/// second across into `tm_1`'s third method.
pub fn ordered_domain() -> Domain {
    use ordered::{tm_1_1, tm_1_2, tm_1_3, tm_2_1, tm_2_2};
    let mut domain = base();
    domain
        .declare_task_methods(
            "tm_1",
            vec![
                Method::new("tm_1_1", tm_1_1),
                Method::new("tm_1_2", tm_1_2),
                Method::new("tm_1_3", tm_1_3),
            ],
        )
        .declare_task_methods(
            "tm_2",
            vec![Method::new("tm_2_1", tm_2_1), Method::new("tm_2_2", tm_2_2)],
        );
    domain
}

mod nested {
    use super::{links, sub_then, State, Todo, Value};

    pub fn tm_1_1(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        sub_then("tm_2", &[(3, 4), (4, 5)])
    }
    pub fn tm_1_2(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        sub_then("tm_2", &[(3, 4), (4, 5), (5, 6)])
    }
    pub fn tm_2_1(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(0, 1), (1, 2), (2, 3)])
    }
    pub fn tm_2_2(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(0, 1), (1, 2), (2, 3), (3, 7)])
    }
    pub fn tm_2_3(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(0, 1), (1, 3), (3, 7)])
    }
    pub fn tm_3_unreachable(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(9, 10)])
    }
    pub fn tm_3_1(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        links(&[(7, 8)])
    }
}

/// `tm_1` nests `tm_2`; `tm_3` needs `flag[9]`, which nothing sets, so every
/// combination is tried and the plan is empty.
pub fn unsolvable_domain() -> Domain {
    use nested::{tm_1_1, tm_1_2, tm_2_1, tm_2_2, tm_3_unreachable};
    let mut domain = base();
    domain
        .declare_task_methods(
            "tm_1",
            vec![
                Method::new("tm_1_1", tm_1_1),
                Method::new("tm_1_2", tm_1_2),
                Method::new("tm_1_2", tm_1_2),
            ],
        )
        .declare_task_methods(
            "tm_2",
            vec![Method::new("tm_2_1", tm_2_1), Method::new("tm_2_2", tm_2_2)],
        )
        .declare_task_methods("tm_3", vec![Method::new("tm_3_1", tm_3_unreachable)]);
    domain
}

/// `tm_1` nests `tm_2`, whose third method avoids the `(2, 3)` link; `tm_3`
/// needs `flag[7]`.
pub fn replan_domain() -> Domain {
    use nested::{tm_1_1, tm_1_2, tm_2_1, tm_2_2, tm_2_3, tm_3_1};
    let mut domain = base();
    domain
        .declare_task_methods(
            "tm_1",
            vec![Method::new("tm_1_1", tm_1_1), Method::new("tm_1_2", tm_1_2)],
        )
        .declare_task_methods(
            "tm_2",
            vec![
                Method::new("tm_2_1", tm_2_1),
                Method::new("tm_2_2", tm_2_2),
                Method::new("tm_2_3", tm_2_3),
            ],
        )
        .declare_task_methods("tm_3", vec![Method::new("tm_3_1", tm_3_1)]);
    domain
}

/// The calls `[tm_1, tm_2]` or `[tm_1, tm_3]`.
pub fn tasks(names: &[&str]) -> Vec<Todo> {
    names.iter().map(|n| Call::bare(*n).into()).collect()
}

/// A plan as a list of chain links.
pub fn plan_of(pairs: &[(i64, i64)]) -> Vec<Call> {
    pairs.iter().map(|&(from, to)| link(from, to)).collect()
}
