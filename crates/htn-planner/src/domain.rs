// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain registry: ordered method tables and action effects.
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::multigoal::MultiGoal;
use crate::payload::Todo;
use crate::state::State;
use crate::value::Value;

/// Function pointer for task and goal methods.
///
/// Task methods receive the task arguments; goal methods receive
/// `[key, desired_value]`. `None` means the method does not apply.
pub type MethodFn = fn(&State, &[Value]) -> Option<Vec<Todo>>;

/// Function pointer for multigoal methods.
pub type MultiGoalMethodFn = fn(&State, &MultiGoal) -> Option<Vec<Todo>>;

/// Function pointer for action effects.
///
/// The action owns a private copy of the current state and returns the
/// complete successor, or `None` when it is inapplicable.
pub type ActionFn = fn(State, &[Value]) -> Option<State>;

/// A named task or goal method.
#[derive(Clone, Copy, Debug)]
pub struct Method {
    /// Human-readable name for logs and debugging.
    pub name: &'static str,
    /// Decomposition callback.
    pub func: MethodFn,
}

impl Method {
    /// Pairs a name with its callback.
    pub const fn new(name: &'static str, func: MethodFn) -> Self {
        Self { name, func }
    }
}

/// A named multigoal method.
#[derive(Clone, Copy, Debug)]
pub struct MultiGoalMethod {
    /// Human-readable name for logs and debugging.
    pub name: &'static str,
    /// Decomposition callback.
    pub func: MultiGoalMethodFn,
}

impl MultiGoalMethod {
    /// Pairs a name with its callback.
    pub const fn new(name: &'static str, func: MultiGoalMethodFn) -> Self {
        Self { name, func }
    }
}

/// A named primitive action.
#[derive(Clone, Copy, Debug)]
pub struct Action {
    /// Action name; task lists refer to the action by this name.
    pub name: &'static str,
    /// Effect callback.
    pub func: ActionFn,
}

impl Action {
    /// Pairs a name with its effect.
    pub const fn new(name: &'static str, func: ActionFn) -> Self {
        Self { name, func }
    }
}

/// Execution metadata for an action. Search never reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionModel {
    /// Relative outcome weights; outcome 0 is success, the rest are failures.
    pub outcome_weights: Vec<f64>,
    /// Scalar cost of one execution.
    pub cost: f64,
}

impl Default for ActionModel {
    fn default() -> Self {
        Self {
            outcome_weights: vec![1.0, 0.0],
            cost: 1.0,
        }
    }
}

/// Errors raised while declaring a domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A model was supplied for an action that was never declared.
    #[error("action not declared: {0}")]
    UnknownAction(String),
    /// Outcome weights were empty, negative, non-finite, or summed to zero.
    #[error("invalid outcome weights for {0}")]
    InvalidWeights(String),
    /// Cost was negative or non-finite.
    #[error("invalid cost for {0}")]
    InvalidCost(String),
}

#[derive(Clone, Debug)]
struct ActionEntry {
    action: Action,
    model: ActionModel,
}

/// Read-only lookup tables consulted by the planner.
///
/// Declaration order inside each list is the order the planner tries the
/// candidates in. Re-declaring a name replaces its list.
#[derive(Clone, Debug)]
pub struct Domain {
    tasks: BTreeMap<String, Vec<Method>>,
    goals: BTreeMap<String, Vec<Method>>,
    multigoals: BTreeMap<Option<String>, Vec<MultiGoalMethod>>,
    actions: BTreeMap<String, ActionEntry>,
}

impl Default for Domain {
    fn default() -> Self {
        Self::new()
    }
}

impl Domain {
    /// Creates an empty domain. The default multigoal tag starts with no methods.
    pub fn new() -> Self {
        let mut multigoals = BTreeMap::new();
        multigoals.insert(None, Vec::new());
        Self {
            tasks: BTreeMap::new(),
            goals: BTreeMap::new(),
            multigoals,
            actions: BTreeMap::new(),
        }
    }

    /// Declares the complete method list for task `name`.
    pub fn declare_task_methods(&mut self, name: &str, methods: Vec<Method>) -> &mut Self {
        self.tasks.insert(name.to_owned(), methods);
        self
    }

    /// Declares the complete method list for goals on state variable `var`.
    pub fn declare_goal_methods(&mut self, var: &str, methods: Vec<Method>) -> &mut Self {
        self.goals.insert(var.to_owned(), methods);
        self
    }

    /// Declares the complete method list for multigoals carrying `tag`.
    pub fn declare_multigoal_methods(
        &mut self,
        tag: Option<&str>,
        methods: Vec<MultiGoalMethod>,
    ) -> &mut Self {
        self.multigoals.insert(tag.map(str::to_owned), methods);
        self
    }

    /// Declares actions with the default execution model.
    pub fn declare_actions(&mut self, actions: Vec<Action>) -> &mut Self {
        for action in actions {
            self.actions.insert(
                action.name.to_owned(),
                ActionEntry {
                    action,
                    model: ActionModel::default(),
                },
            );
        }
        self
    }

    /// Attaches outcome weights and cost to a declared action.
    ///
    /// # Errors
    /// Returns [`DomainError::UnknownAction`] when `name` was not declared,
    /// or a validation error for malformed weights or cost.
    pub fn declare_action_model(
        &mut self,
        name: &str,
        outcome_weights: Vec<f64>,
        cost: f64,
    ) -> Result<(), DomainError> {
        let Some(entry) = self.actions.get_mut(name) else {
            return Err(DomainError::UnknownAction(name.to_owned()));
        };
        let sum: f64 = outcome_weights.iter().sum();
        if outcome_weights.is_empty()
            || outcome_weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || sum <= 0.0
        {
            return Err(DomainError::InvalidWeights(name.to_owned()));
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(DomainError::InvalidCost(name.to_owned()));
        }
        entry.model = ActionModel {
            outcome_weights,
            cost,
        };
        Ok(())
    }

    /// Ordered methods for task `name`, if it is a task.
    pub fn task_methods(&self, name: &str) -> Option<&[Method]> {
        self.tasks.get(name).map(Vec::as_slice)
    }

    /// Ordered methods for goals on `var`, if any were declared.
    pub fn goal_methods(&self, var: &str) -> Option<&[Method]> {
        self.goals.get(var).map(Vec::as_slice)
    }

    /// Ordered methods for multigoals tagged `tag`.
    pub fn multigoal_methods(&self, tag: Option<&str>) -> Option<&[MultiGoalMethod]> {
        self.multigoals
            .get(&tag.map(str::to_owned))
            .map(Vec::as_slice)
    }

    /// The action declared as `name`.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name).map(|entry| &entry.action)
    }

    /// Execution model of action `name`.
    pub fn action_model(&self, name: &str) -> Option<&ActionModel> {
        self.actions.get(name).map(|entry| &entry.model)
    }
}

fn write_table<'a>(
    f: &mut fmt::Formatter<'_>,
    header: &str,
    rows: impl Iterator<Item = (String, Vec<&'a str>)>,
) -> fmt::Result {
    writeln!(f, "{header:<30}METHODS:")?;
    for (key, names) in rows {
        writeln!(f, "{key:<30}{}", names.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_table(
            f,
            "TASK:",
            self.tasks
                .iter()
                .map(|(k, ms)| (k.clone(), ms.iter().map(|m| m.name).collect())),
        )?;
        writeln!(f)?;
        write_table(
            f,
            "GOAL:",
            self.goals
                .iter()
                .map(|(k, ms)| (k.clone(), ms.iter().map(|m| m.name).collect())),
        )?;
        writeln!(f)?;
        write_table(
            f,
            "MULTIGOAL:",
            self.multigoals.iter().map(|(k, ms)| {
                (
                    k.clone().unwrap_or_else(|| "None".to_owned()),
                    ms.iter().map(|m| m.name).collect(),
                )
            }),
        )?;
        writeln!(f)?;
        let names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        write!(f, "ACTIONS: {}", names.join(", "))
    }
}
