// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Refinement engine: the iterative depth-first loop over the decomposition tree.
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::PlannerConfig;
use crate::domain::Domain;
use crate::ident::NodeId;
use crate::payload::{Call, Todo};
use crate::state::State;
use crate::tree::{NodeKind, NodePayload, Status, Tag, Tree, TreeError};

/// Errors emitted by the planner.
///
/// None of these mean "no plan exists"; infeasibility is reported as an
/// empty plan. They signal a misconfigured domain, a bad replan request, or
/// a planner defect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// A call matched no task, action, or goal table.
    #[error("no task, action, or goal named {0:?}")]
    UnknownTodo(String),
    /// A multigoal carried a tag with no declared methods.
    #[error("no multigoal methods declared for tag {0:?}")]
    UnknownMultiGoalTag(Option<String>),
    /// A goal call did not have the `(var, key, value)` shape.
    #[error("malformed goal {0}: expected (var, key, value)")]
    MalformedGoal(Call),
    /// An action referenced by a plan is not declared.
    #[error("action not declared: {0}")]
    UnknownAction(String),
    /// An action's outcome weights could not be sampled.
    #[error("unusable outcome model for {0}")]
    InvalidModel(String),
    /// The node id is not part of the current tree.
    #[error("node {0} not in the decomposition tree")]
    UnknownNode(NodeId),
    /// Replanning was requested from a node that is not an action.
    #[error("node {0} is not an action")]
    NotAnAction(NodeId),
    /// Replanning was requested before any plan was produced.
    #[error("no solution tree to replan against")]
    NoSolutionTree,
    /// The configured iteration cap was hit.
    #[error("search exceeded {0} iterations")]
    IterationLimit(usize),
    /// Simulation hit an action whose effect returned no state.
    #[error("action {action} rejected at plan index {index}")]
    ActionRejected {
        /// Position in the plan.
        index: usize,
        /// The rejected action.
        action: Call,
    },
    /// Structural invariant broken.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Outcome of refining one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The node gained children; refine them next.
    Descend,
    /// The node closed without children; keep scanning the focus.
    Stay,
    /// Refinement failed; backtrack.
    Fail,
}

/// Hierarchical planner over a shared, read-only [`Domain`].
///
/// The planner owns the live state and the decomposition tree between calls
/// so that [`Planner::replan`] can resume from a reported failure. One
/// instance is single-threaded; independent planners may share the domain.
pub struct Planner {
    pub(crate) domain: Arc<Domain>,
    pub(crate) config: PlannerConfig,
    pub(crate) state: State,
    pub(crate) tree: Tree,
    pub(crate) blacklist: BTreeSet<Call>,
    pub(crate) solution: Vec<(NodeId, Call)>,
    pub(crate) iterations: usize,
    pub(crate) planned: bool,
}

impl Planner {
    /// Creates a planner with default settings.
    pub fn new(domain: Arc<Domain>) -> Self {
        Self::with_config(domain, PlannerConfig::default())
    }

    /// Creates a planner with explicit settings.
    pub fn with_config(domain: Arc<Domain>, config: PlannerConfig) -> Self {
        Self {
            domain,
            config,
            state: State::default(),
            tree: Tree::new(),
            blacklist: BTreeSet::new(),
            solution: Vec::new(),
            iterations: 0,
            planned: false,
        }
    }

    /// Searches for an action sequence accomplishing `todo` from `state`.
    ///
    /// Returns an empty plan when no decomposition succeeds.
    ///
    /// # Errors
    /// Configuration errors from the domain tables, [`PlanError::IterationLimit`]
    /// when a cap is set and exceeded, or a structural [`PlanError::Tree`]
    /// defect detected in debug builds.
    #[instrument(skip_all, fields(state = state.name(), todo = todo.len()))]
    pub fn plan(&mut self, state: &State, todo: Vec<Todo>) -> Result<Vec<Call>, PlanError> {
        info!("planning");
        self.state = state.clone();
        self.tree = Tree::new();
        self.solution.clear();
        self.iterations = 0;
        self.planned = true;

        self.tree.expand(NodeId::ROOT, todo, &self.domain)?;
        self.search(NodeId::ROOT)?;
        let plan = self.extract(None)?;
        info!(
            actions = plan.len(),
            iterations = self.iterations,
            "planning finished"
        );
        Ok(plan)
    }

    /// Forces every future application of `action` to fail.
    pub fn blacklist(&mut self, action: Call) {
        debug!(%action, "blacklisted");
        self.blacklist.insert(action);
    }

    /// Returns `true` if `action` has been blacklisted.
    pub fn is_blacklisted(&self, action: &Call) -> bool {
        self.blacklist.contains(action)
    }

    /// Node ids backing the most recent plan, in plan order.
    #[must_use]
    pub fn solution_nodes(&self) -> Vec<NodeId> {
        self.solution.iter().map(|(id, _)| *id).collect()
    }

    /// Live state at the end of the most recent search.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The decomposition tree of the most recent search.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Loop iterations spent by the most recent search.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The domain this planner consults.
    #[must_use]
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// Applies the most recent plan to `state` from `start` onward and
    /// returns every intermediate state, `state` itself first.
    ///
    /// # Errors
    /// [`PlanError::ActionRejected`] when an effect returns no state, or
    /// [`PlanError::UnknownAction`] for an undeclared action.
    #[instrument(skip_all, fields(start = start))]
    pub fn simulate(&self, state: &State, start: usize) -> Result<Vec<State>, PlanError> {
        let mut trace = vec![state.clone()];
        let mut current = state.clone();
        for (index, (_, call)) in self.solution.iter().enumerate().skip(start) {
            let action = self
                .domain
                .action(&call.name)
                .ok_or_else(|| PlanError::UnknownAction(call.name.clone()))?;
            current = (action.func)(current, &call.args).ok_or_else(|| {
                PlanError::ActionRejected {
                    index,
                    action: call.clone(),
                }
            })?;
            trace.push(current.clone());
        }
        Ok(trace)
    }

    /// Runs the refinement loop until the scan climbs past the root.
    pub(crate) fn search(&mut self, mut focus: NodeId) -> Result<(), PlanError> {
        let mut iteration = 0_usize;
        loop {
            if let Some(limit) = self.config.max_iterations {
                if iteration >= limit {
                    self.iterations = iteration;
                    return Err(PlanError::IterationLimit(limit));
                }
            }
            iteration += 1;

            let Some(current) = self.tree.first_open_child(focus) else {
                match self.tree.parent(focus) {
                    Some(parent) => {
                        focus = parent;
                        continue;
                    }
                    None => break,
                }
            };

            let kind = {
                let node = self
                    .tree
                    .node_mut(current)
                    .ok_or(PlanError::UnknownNode(current))?;
                node.snapshot_or_restore(&mut self.state);
                node.kind()
            };
            debug!(iteration, node = %current, ?kind, "refining");

            let step = match kind {
                NodeKind::Task | NodeKind::Goal | NodeKind::MultiGoal => {
                    self.refine_decomposable(current, kind)?
                }
                NodeKind::Action => self.apply_action(current)?,
                NodeKind::VerifyGoal | NodeKind::VerifyMultiGoal => {
                    self.verify(focus, current)?
                }
                NodeKind::Root => return Err(TreeError::MisplacedRoot(current).into()),
            };

            match step {
                Step::Descend => focus = current,
                Step::Stay => {}
                Step::Fail => focus = self.backtrack(focus, current),
            }
        }
        self.iterations = iteration;
        Ok(())
    }

    fn refine_decomposable(&mut self, id: NodeId, kind: NodeKind) -> Result<Step, PlanError> {
        let node = self.tree.node(id).ok_or(PlanError::UnknownNode(id))?;
        let satisfied = match (kind, node.payload()) {
            (NodeKind::Goal, NodePayload::Call(goal)) => goal_holds(&self.state, goal)?,
            (NodeKind::MultiGoal, NodePayload::MultiGoal(goal)) => goal.is_achieved(&self.state),
            _ => false,
        };
        if satisfied {
            debug!(node = %id, "already achieved");
            self.close(id);
            return Ok(Step::Stay);
        }

        let expansion = self
            .tree
            .node_mut(id)
            .and_then(|node| node.next_expansion(&self.state));
        match expansion {
            Some(todo) => {
                self.close(id);
                self.tree.expand(id, todo, &self.domain)?;
                Ok(Step::Descend)
            }
            None => {
                debug!(node = %id, "methods exhausted");
                Ok(Step::Fail)
            }
        }
    }

    fn apply_action(&mut self, id: NodeId) -> Result<Step, PlanError> {
        let node = self.tree.node(id).ok_or(PlanError::UnknownNode(id))?;
        let call = node.call().ok_or(PlanError::NotAnAction(id))?;
        if self.blacklist.contains(call) {
            debug!(node = %id, %call, "blacklisted action");
            return Ok(Step::Fail);
        }
        let action = self
            .domain
            .action(&call.name)
            .ok_or_else(|| PlanError::UnknownAction(call.name.clone()))?;
        match (action.func)(self.state.clone(), &call.args) {
            Some(next) => {
                self.state.update(next);
                self.close(id);
                Ok(Step::Stay)
            }
            None => {
                debug!(node = %id, %call, "action inapplicable");
                Ok(Step::Fail)
            }
        }
    }

    /// Re-checks the condition of `owner` (the verify node's parent).
    fn verify(&mut self, owner: NodeId, id: NodeId) -> Result<Step, PlanError> {
        let node = self.tree.node(owner).ok_or(PlanError::UnknownNode(owner))?;
        let holds = match node.payload() {
            NodePayload::Call(goal) => goal_holds(&self.state, goal)?,
            NodePayload::MultiGoal(goal) => goal.is_achieved(&self.state),
            NodePayload::Root | NodePayload::Verify => false,
        };
        if holds {
            self.close(id);
            Ok(Step::Stay)
        } else {
            debug!(node = %owner, "verification failed");
            Ok(Step::Fail)
        }
    }

    fn close(&mut self, id: NodeId) {
        if let Some(node) = self.tree.node_mut(id) {
            node.status = Status::Closed;
        }
    }

    /// Validates the tree (debug builds) and records the emitted plan.
    pub(crate) fn extract(&mut self, tag: Option<Tag>) -> Result<Vec<Call>, PlanError> {
        if cfg!(debug_assertions) {
            if let Err(e) = self.tree.validate() {
                error!(error = %e, "decomposition tree invariant broken");
                return Err(e.into());
            }
        }
        self.solution = self
            .tree
            .actions(tag)
            .into_iter()
            .map(|(id, call)| (id, call.clone()))
            .collect();
        Ok(self.solution.iter().map(|(_, call)| call.clone()).collect())
    }
}

fn goal_holds(state: &State, goal: &Call) -> Result<bool, PlanError> {
    let (key, value) = goal
        .goal_binding()
        .ok_or_else(|| PlanError::MalformedGoal(goal.clone()))?;
    Ok(state.holds(&goal.name, key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;
    use crate::value::Value;

    fn step(state: State, _: &[Value]) -> Option<State> {
        Some(state)
    }

    #[test]
    fn root_kind_below_the_root_aborts_the_search() {
        let mut domain = Domain::new();
        domain.declare_actions(vec![Action::new("a_step", step)]);
        let mut planner = Planner::new(Arc::new(domain));
        let plan = planner.plan(&State::new("s"), vec![Call::bare("a_step").into()]);
        assert_eq!(plan, Ok(vec![Call::bare("a_step")]));

        let stray = planner.tree.graft(NodeId::ROOT, NodeKind::Root);
        assert_eq!(
            planner.search(NodeId::ROOT),
            Err(PlanError::Tree(TreeError::MisplacedRoot(stray)))
        );
    }
}
