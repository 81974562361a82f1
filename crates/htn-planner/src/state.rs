// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! World state: named groups of state-variable bindings.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One state-variable group: entity key to value.
pub type Bindings = BTreeMap<Value, Value>;

/// A named collection of state-variable groups.
///
/// `State` is plain data. Cloning produces a deep, independent copy, which is
/// what the engine relies on when it snapshots a node on first visit. Keys
/// iterate in [`Value`] order so that domains scanning a group behave the
/// same on every run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    name: String,
    vars: BTreeMap<String, Bindings>,
}

impl State {
    /// Creates an empty state called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: BTreeMap::new(),
        }
    }

    /// Returns the state's label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value bound to `key` in group `var`, if any.
    pub fn get(&self, var: &str, key: &Value) -> Option<&Value> {
        self.vars.get(var).and_then(|group| group.get(key))
    }

    /// Binds `key` to `value` in group `var`, creating the group on demand.
    pub fn set(&mut self, var: &str, key: impl Into<Value>, value: impl Into<Value>) {
        self.vars
            .entry(var.to_owned())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Builder form of [`State::set`].
    #[must_use]
    pub fn with(mut self, var: &str, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.set(var, key, value);
        self
    }

    /// Returns `true` when `var[key] == value`. A missing binding never holds.
    pub fn holds(&self, var: &str, key: &Value, value: &Value) -> bool {
        self.get(var, key) == Some(value)
    }

    /// Returns the whole group `var`.
    pub fn group(&self, var: &str) -> Option<&Bindings> {
        self.vars.get(var)
    }

    /// Iterates the groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Bindings)> {
        self.vars.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Replaces every group present in `other`; groups absent from `other`
    /// are left untouched. The name is kept.
    pub fn update(&mut self, other: State) {
        self.vars.extend(other.vars);
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vars.is_empty() {
            return write!(f, "{} = {{}}", self.name);
        }
        for (i, (var, group)) in self.vars.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}.{var} = {}", self.name, Value::Map(group.clone()))?;
        }
        Ok(())
    }
}
