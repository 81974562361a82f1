// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ground task, goal, and action instances.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::multigoal::MultiGoal;
use crate::value::Value;

/// A ground `(name, args...)` instance.
///
/// The same shape covers task calls, action calls and single goals. For a
/// goal, `name` is the state variable and `args` is `[key, desired_value]`.
/// Which one a call denotes is decided by the domain tables when the call is
/// placed in the decomposition tree.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Call {
    /// Task, action, or state-variable name.
    pub name: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

impl Call {
    /// Creates a call with the given arguments.
    pub fn new<I, V>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an argument-less call.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates the goal `var[key] = value`.
    pub fn goal(var: impl Into<String>, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            name: var.into(),
            args: vec![key.into(), value.into()],
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Splits a goal call into `(key, desired_value)`.
    pub(crate) fn goal_binding(&self) -> Option<(&Value, &Value)> {
        match self.args.as_slice() {
            [key, value] => Some((key, value)),
            _ => None,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.name)?;
        for arg in &self.args {
            write!(f, ", {arg}")?;
        }
        f.write_str(")")
    }
}

/// One entry of a task list or method expansion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Todo {
    /// A task, single goal, or action call.
    Call(Call),
    /// A conjunctive goal.
    MultiGoal(MultiGoal),
}

impl From<Call> for Todo {
    fn from(call: Call) -> Self {
        Self::Call(call)
    }
}

impl From<MultiGoal> for Todo {
    fn from(goal: MultiGoal) -> Self {
        Self::MultiGoal(goal)
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(call) => write!(f, "{call}"),
            Self::MultiGoal(goal) => write!(f, "<multigoal {}>", goal.name()),
        }
    }
}
