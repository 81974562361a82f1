// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Conjunctive goals and the stock splitting method.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::payload::{Call, Todo};
use crate::state::{Bindings, State};
use crate::value::Value;

/// A tagged conjunction of desired state-variable bindings.
///
/// The tag selects which multigoal methods apply; `None` is the default tag.
/// Once handed to the planner a multigoal is never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MultiGoal {
    name: String,
    tag: Option<String>,
    vars: BTreeMap<String, Bindings>,
}

impl MultiGoal {
    /// Creates an empty multigoal with the default tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            vars: BTreeMap::new(),
        }
    }

    /// Creates an empty multigoal resolved by the methods declared for `tag`.
    pub fn tagged(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: Some(tag.into()),
            vars: BTreeMap::new(),
        }
    }

    /// Returns the multigoal's label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the method tag (`None` for the default table entry).
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Adds the desired binding `var[key] = value`.
    #[must_use]
    pub fn with(mut self, var: &str, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.vars
            .entry(var.to_owned())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Returns the desired value for `var[key]`, if the multigoal names it.
    pub fn get(&self, var: &str, key: &Value) -> Option<&Value> {
        self.vars.get(var).and_then(|group| group.get(key))
    }

    /// Returns the desired bindings of group `var`.
    pub fn group(&self, var: &str) -> Option<&Bindings> {
        self.vars.get(var)
    }

    /// Iterates every desired binding as `(var, key, value)`.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value, &Value)> {
        self.vars
            .iter()
            .flat_map(|(var, group)| group.iter().map(move |(k, v)| (var.as_str(), k, v)))
    }

    /// Returns `true` when the multigoal names no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.values().all(BTreeMap::is_empty)
    }

    /// Returns the bindings that do not currently hold in `state`.
    ///
    /// A key missing from the state counts as unachieved.
    pub fn unachieved(&self, state: &State) -> Self {
        let mut out = Self {
            name: self.name.clone(),
            tag: self.tag.clone(),
            vars: BTreeMap::new(),
        };
        for (var, key, value) in self.bindings() {
            if !state.holds(var, key, value) {
                out.vars
                    .entry(var.to_owned())
                    .or_default()
                    .insert(key.clone(), value.clone());
            }
        }
        out
    }

    /// Returns `true` when every binding holds in `state`.
    pub fn is_achieved(&self, state: &State) -> bool {
        self.bindings().all(|(var, key, value)| state.holds(var, key, value))
    }
}

impl fmt::Display for MultiGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (var, group)) in self.vars.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}.{var} = {}", self.name, Value::Map(group.clone()))?;
        }
        Ok(())
    }
}

/// Stock multigoal method: one goal per unachieved binding, then the
/// multigoal again.
///
/// Re-posting the multigoal makes the planner revisit bindings that a later
/// subgoal falsified. Goal order is the deterministic binding order; nothing
/// smarter is attempted. Returns an empty list when every binding holds.
pub fn split_multigoal(state: &State, multigoal: &MultiGoal) -> Option<Vec<Todo>> {
    let pending = multigoal.unachieved(state);
    let mut todo: Vec<Todo> = pending
        .bindings()
        .map(|(var, key, value)| Todo::Call(Call::goal(var, key.clone(), value.clone())))
        .collect();
    if !todo.is_empty() {
        todo.push(Todo::MultiGoal(multigoal.clone()));
    }
    Some(todo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> State {
        State::new("s")
            .with("loc", "c0", "room0")
            .with("loc", "c1", "room1")
            .with("loc", "c2", "room2")
    }

    #[test]
    fn unachieved_keeps_only_differing_bindings() {
        let goal = MultiGoal::new("g")
            .with("loc", "c0", "room0")
            .with("loc", "c1", "room3")
            .with("loc", "c2", "room4");
        let pending = goal.unachieved(&state());
        let keys: Vec<_> = pending.bindings().map(|(_, k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            keys,
            vec![("c1".into(), "room3".into()), ("c2".into(), "room4".into())]
        );
        assert!(!goal.is_achieved(&state()));
    }

    #[test]
    fn missing_state_key_is_unachieved() {
        let goal = MultiGoal::new("g").with("loc", "c9", "room0");
        assert!(!goal.unachieved(&state()).is_empty());
    }

    #[test]
    fn split_appends_multigoal_after_pending_goals() {
        let goal = MultiGoal::new("g").with("loc", "c1", "room3");
        let todo = split_multigoal(&state(), &goal).unwrap_or_default();
        assert_eq!(
            todo,
            vec![
                Todo::Call(Call::goal("loc", "c1", "room3")),
                Todo::MultiGoal(goal.clone()),
            ]
        );
    }

    #[test]
    fn split_of_achieved_goal_is_empty() {
        let goal = MultiGoal::new("g").with("loc", "c0", "room0");
        assert_eq!(split_multigoal(&state(), &goal), Some(Vec::new()));
    }
}
