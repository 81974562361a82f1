// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decomposition tree: an arena of nodes addressed by [`NodeId`].
use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::domain::{Domain, Method, MultiGoalMethod};
use crate::engine_impl::PlanError;
use crate::ident::NodeId;
use crate::multigoal::MultiGoal;
use crate::payload::{Call, Todo};
use crate::state::State;

/// Structural invariant violations. These indicate a planner defect, never
/// a domain condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The root node is absent.
    #[error("root node missing")]
    MissingRoot,
    /// The root node has a parent.
    #[error("root node has a parent")]
    RootHasParent,
    /// A node other than the root carries the root kind.
    #[error("node {0} has the root kind but sits below the root")]
    MisplacedRoot(NodeId),
    /// A link points at a node that does not exist.
    #[error("node {0} referenced but missing")]
    MissingNode(NodeId),
    /// Parent and child links disagree.
    #[error("node {child} not listed under its parent {parent}")]
    ParentMismatch {
        /// The node whose parent link is inconsistent.
        child: NodeId,
        /// The parent it claims.
        parent: NodeId,
    },
    /// A node was reached twice while walking from the root.
    #[error("node {0} reached twice from the root")]
    Cycle(NodeId),
    /// A node cannot be reached from the root.
    #[error("node {0} unreachable from the root")]
    Unreachable(NodeId),
}

/// Node classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The synthetic root holding the initial task list.
    Root,
    /// A task resolved by task methods.
    Task,
    /// A single `(var, key, value)` goal.
    Goal,
    /// A conjunctive goal.
    MultiGoal,
    /// A primitive action; always a leaf.
    Action,
    /// Re-check of the owning goal after its subtree ran.
    VerifyGoal,
    /// Re-check of the owning multigoal after its subtree ran.
    VerifyMultiGoal,
}

impl NodeKind {
    /// Returns `true` for kinds that carry a method cursor and snapshot.
    #[must_use]
    pub fn is_decomposable(self) -> bool {
        matches!(self, Self::Task | Self::Goal | Self::MultiGoal)
    }
}

/// Refinement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not yet (or no longer) refined.
    Open,
    /// Successfully refined or applied.
    Closed,
}

/// History tag used when extracting a replanned suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Committed before the reported failure.
    Old,
    /// Created or recomputed since the last plan/replan call began.
    New,
}

/// What a node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePayload {
    /// Root marker.
    Root,
    /// Task, goal, or action call.
    Call(Call),
    /// Conjunctive goal.
    MultiGoal(MultiGoal),
    /// Verification marker; the condition lives on the parent.
    Verify,
}

/// Ordered candidate list of a decomposable node.
#[derive(Debug, Clone)]
pub(crate) enum Candidates {
    Methods(Vec<Method>),
    MultiGoal(Vec<MultiGoalMethod>),
}

impl Candidates {
    fn len(&self) -> usize {
        match self {
            Self::Methods(ms) => ms.len(),
            Self::MultiGoal(ms) => ms.len(),
        }
    }

    fn name(&self, index: usize) -> Option<&'static str> {
        match self {
            Self::Methods(ms) => ms.get(index).map(|m| m.name),
            Self::MultiGoal(ms) => ms.get(index).map(|m| m.name),
        }
    }
}

/// Resumable search position of a decomposable node.
///
/// `cursor` is the index of the next untried candidate. It persists across
/// reopenings and is only rewound by [`Decomposition::reset`].
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub(crate) candidates: Candidates,
    pub(crate) cursor: usize,
    pub(crate) selected: Option<usize>,
    pub(crate) snapshot: Option<State>,
}

impl Decomposition {
    fn new(candidates: Candidates) -> Self {
        Self {
            candidates,
            cursor: 0,
            selected: None,
            snapshot: None,
        }
    }

    /// Number of candidate methods.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Index of the next untried candidate.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Name of the candidate most recently tried, if any.
    #[must_use]
    pub fn selected_method(&self) -> Option<&'static str> {
        self.selected.and_then(|i| self.candidates.name(i))
    }

    /// State saved at first visit, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&State> {
        self.snapshot.as_ref()
    }

    /// Rewinds to candidate #0 and forgets the snapshot.
    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
        self.selected = None;
        self.snapshot = None;
    }
}

/// One element of the decomposition tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    payload: NodePayload,
    pub(crate) status: Status,
    pub(crate) tag: Tag,
    pub(crate) decomposition: Option<Decomposition>,
}

impl Node {
    /// The node's identifier.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The unique parent (`None` only for the root).
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in creation order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Node classification.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Payload.
    #[must_use]
    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    /// The call payload, for task, goal and action nodes.
    #[must_use]
    pub fn call(&self) -> Option<&Call> {
        match &self.payload {
            NodePayload::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Refinement status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// History tag.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Cursor and snapshot, for decomposable kinds.
    #[must_use]
    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.decomposition.as_ref()
    }

    /// Advances the cursor until a candidate applies to `state`.
    ///
    /// Every candidate tried is consumed, applicable or not, so a later
    /// reopening continues with the one after the last success.
    pub(crate) fn next_expansion(&mut self, state: &State) -> Option<Vec<Todo>> {
        let dec = self.decomposition.as_mut()?;
        while dec.cursor < dec.candidates.len() {
            let index = dec.cursor;
            dec.cursor += 1;
            dec.selected = Some(index);
            let result = match (&dec.candidates, &self.payload) {
                (Candidates::Methods(ms), NodePayload::Call(call)) => {
                    ms.get(index).and_then(|m| (m.func)(state, &call.args))
                }
                (Candidates::MultiGoal(ms), NodePayload::MultiGoal(goal)) => {
                    ms.get(index).and_then(|m| (m.func)(state, goal))
                }
                _ => None,
            };
            tracing::debug!(
                node = %self.id,
                method = dec.candidates.name(index).unwrap_or_default(),
                applicable = result.is_some(),
                "tried method"
            );
            if result.is_some() {
                return result;
            }
        }
        None
    }

    /// Saves `state` on first visit, or restores the saved copy into `state`
    /// on a revisit. Non-decomposable nodes are left alone.
    pub(crate) fn snapshot_or_restore(&mut self, state: &mut State) {
        let Some(dec) = self.decomposition.as_mut() else {
            return;
        };
        if let Some(saved) = dec.snapshot.as_ref() {
            tracing::trace!(node = %self.id, "restoring snapshot");
            state.update(saved.clone());
            return;
        }
        tracing::trace!(node = %self.id, "taking snapshot");
        dec.snapshot = Some(state.clone());
    }
}

/// Rooted tree of refinement attempts.
///
/// Nodes live in an id-keyed map; every link is stored on both ends and the
/// single-parent invariant holds by construction. [`Tree::validate`] checks
/// it explicitly for tests and debug builds.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: BTreeMap<NodeId, Node>,
    next_id: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only the root.
    #[must_use]
    pub fn new() -> Self {
        let root = Node {
            id: NodeId::ROOT,
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Root,
            payload: NodePayload::Root,
            status: Status::Open,
            tag: Tag::New,
            decomposition: None,
        };
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId::ROOT, root);
        Self { nodes, next_id: 1 }
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The id the next created node will receive.
    #[must_use]
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    /// Returns a node when it exists.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Iterates all nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Children of `id` in creation order (empty for unknown ids).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// First `Open` immediate child of `id`, scanning in creation order.
    pub fn first_open_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.nodes.get(c).is_some_and(|n| n.status == Status::Open))
    }

    /// Pre-order walk of the subtree rooted at `from` (inclusive).
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(&from) {
            return out;
        }
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Every node strictly below `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut all = self.preorder(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    /// Deletes every node strictly below `id`; returns how many were removed.
    pub(crate) fn remove_descendants(&mut self, id: NodeId) -> usize {
        let doomed = self.descendants(id);
        for d in &doomed {
            self.nodes.remove(d);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children.clear();
        }
        doomed.len()
    }

    /// Appends one child per entry of `todo` under `parent`, then a verify
    /// child when `parent` is a goal or multigoal.
    ///
    /// Each entry is classified by fixed precedence: multigoal, then task
    /// name, then action name, then goal variable. Nothing is inserted if any
    /// entry fails to classify.
    ///
    /// # Errors
    /// [`PlanError::UnknownTodo`] / [`PlanError::UnknownMultiGoalTag`] when an
    /// entry matches no table, [`PlanError::UnknownNode`] for a missing parent.
    pub(crate) fn expand(
        &mut self,
        parent: NodeId,
        todo: Vec<Todo>,
        domain: &Domain,
    ) -> Result<Vec<NodeId>, PlanError> {
        let parent_kind = self
            .nodes
            .get(&parent)
            .map(Node::kind)
            .ok_or(PlanError::UnknownNode(parent))?;

        let mut staged = Vec::with_capacity(todo.len() + 1);
        for item in todo {
            staged.push(classify(item, domain)?);
        }
        match parent_kind {
            NodeKind::Goal => staged.push((NodeKind::VerifyGoal, NodePayload::Verify, None)),
            NodeKind::MultiGoal => {
                staged.push((NodeKind::VerifyMultiGoal, NodePayload::Verify, None));
            }
            _ => {}
        }

        let mut created = Vec::with_capacity(staged.len());
        for (kind, payload, candidates) in staged {
            let id = NodeId(self.next_id);
            self.next_id += 1;
            self.nodes.insert(
                id,
                Node {
                    id,
                    parent: Some(parent),
                    children: Vec::new(),
                    kind,
                    payload,
                    status: Status::Open,
                    tag: Tag::New,
                    decomposition: candidates.map(Decomposition::new),
                },
            );
            created.push(id);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.extend(created.iter().copied());
        }
        Ok(created)
    }

    /// Lowers the id high-water mark to just above the largest live id.
    pub(crate) fn reset_high_water(&mut self) {
        self.next_id = self.nodes.keys().next_back().map_or(1, |id| id.0 + 1);
    }

    /// Hangs a bare node of `kind` under `parent`, bypassing classification.
    #[cfg(test)]
    pub(crate) fn graft(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                id,
                parent: Some(parent),
                children: Vec::new(),
                kind,
                payload: NodePayload::Root,
                status: Status::Open,
                tag: Tag::New,
                decomposition: None,
            },
        );
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        id
    }

    /// Action nodes in pre-order, optionally restricted to one tag.
    pub fn actions(&self, tag: Option<Tag>) -> Vec<(NodeId, &Call)> {
        self.preorder(NodeId::ROOT)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .filter(|n| n.kind == NodeKind::Action && tag.is_none_or(|t| n.tag == t))
            .filter_map(|n| n.call().map(|c| (n.id, c)))
            .collect()
    }

    /// Checks single-parent, connectivity, and acyclicity.
    ///
    /// # Errors
    /// The first [`TreeError`] found.
    pub fn validate(&self) -> Result<(), TreeError> {
        let root = self.nodes.get(&NodeId::ROOT).ok_or(TreeError::MissingRoot)?;
        if root.parent.is_some() {
            return Err(TreeError::RootHasParent);
        }
        for node in self.nodes.values() {
            if node.kind == NodeKind::Root && node.id != NodeId::ROOT {
                return Err(TreeError::MisplacedRoot(node.id));
            }
            for child in &node.children {
                let c = self.nodes.get(child).ok_or(TreeError::MissingNode(*child))?;
                if c.parent != Some(node.id) {
                    return Err(TreeError::ParentMismatch {
                        child: *child,
                        parent: node.id,
                    });
                }
            }
            if let Some(parent) = node.parent {
                let p = self.nodes.get(&parent).ok_or(TreeError::MissingNode(parent))?;
                if !p.children.contains(&node.id) {
                    return Err(TreeError::ParentMismatch {
                        child: node.id,
                        parent,
                    });
                }
            }
        }
        let mut seen = BTreeSet::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(TreeError::Cycle(id));
            }
            stack.extend(self.children(id).iter().copied());
        }
        if let Some(orphan) = self.nodes.keys().find(|id| !seen.contains(id)) {
            return Err(TreeError::Unreachable(*orphan));
        }
        Ok(())
    }
}

type Staged = (NodeKind, NodePayload, Option<Candidates>);

fn classify(item: Todo, domain: &Domain) -> Result<Staged, PlanError> {
    match item {
        Todo::MultiGoal(goal) => {
            let methods = domain
                .multigoal_methods(goal.tag())
                .ok_or_else(|| PlanError::UnknownMultiGoalTag(goal.tag().map(str::to_owned)))?;
            let candidates = Candidates::MultiGoal(methods.to_vec());
            Ok((NodeKind::MultiGoal, NodePayload::MultiGoal(goal), Some(candidates)))
        }
        Todo::Call(call) => {
            if let Some(methods) = domain.task_methods(&call.name) {
                let candidates = Candidates::Methods(methods.to_vec());
                Ok((NodeKind::Task, NodePayload::Call(call), Some(candidates)))
            } else if domain.action(&call.name).is_some() {
                Ok((NodeKind::Action, NodePayload::Call(call), None))
            } else if let Some(methods) = domain.goal_methods(&call.name) {
                let candidates = Candidates::Methods(methods.to_vec());
                Ok((NodeKind::Goal, NodePayload::Call(call), Some(candidates)))
            } else {
                Err(PlanError::UnknownTodo(call.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;
    use crate::value::Value;

    fn expand_one(_: &State, _: &[Value]) -> Option<Vec<Todo>> {
        Some(vec![Call::bare("a_step").into()])
    }

    fn step(state: State, _: &[Value]) -> Option<State> {
        Some(state)
    }

    fn domain() -> Domain {
        let mut d = Domain::new();
        d.declare_task_methods("job", vec![Method::new("expand_one", expand_one)])
            .declare_goal_methods("loc", vec![Method::new("expand_one", expand_one)])
            .declare_actions(vec![Action::new("a_step", step)]);
        d
    }

    #[test]
    fn expand_classifies_by_precedence_and_appends_verify() {
        let d = domain();
        let mut tree = Tree::new();
        let top = tree
            .expand(
                NodeId::ROOT,
                vec![
                    Call::bare("job").into(),
                    Call::goal("loc", "me", "park").into(),
                    MultiGoal::new("mg").into(),
                    Call::bare("a_step").into(),
                ],
                &d,
            )
            .unwrap_or_default();
        let kinds: Vec<_> = top
            .iter()
            .filter_map(|id| tree.node(*id).map(Node::kind))
            .collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Task, NodeKind::Goal, NodeKind::MultiGoal, NodeKind::Action]
        );

        let goal = top[1];
        let under_goal = tree.expand(goal, Vec::new(), &d).unwrap_or_default();
        assert_eq!(under_goal.len(), 1);
        assert_eq!(
            tree.node(under_goal[0]).map(Node::kind),
            Some(NodeKind::VerifyGoal)
        );
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn unknown_names_are_rejected_without_partial_insert() {
        let d = domain();
        let mut tree = Tree::new();
        let err = tree.expand(
            NodeId::ROOT,
            vec![Call::bare("job").into(), Call::bare("teleport").into()],
            &d,
        );
        assert_eq!(err, Err(PlanError::UnknownTodo("teleport".into())));
        assert!(tree.children(NodeId::ROOT).is_empty());

        let tagged = tree.expand(NodeId::ROOT, vec![MultiGoal::tagged("mg", "nope").into()], &d);
        assert_eq!(tagged, Err(PlanError::UnknownMultiGoalTag(Some("nope".into()))));
    }

    #[test]
    fn preorder_and_pruning() {
        let d = domain();
        let mut tree = Tree::new();
        let top = tree
            .expand(
                NodeId::ROOT,
                vec![Call::bare("job").into(), Call::bare("a_step").into()],
                &d,
            )
            .unwrap_or_default();
        let inner = tree
            .expand(top[0], vec![Call::bare("a_step").into()], &d)
            .unwrap_or_default();
        assert_eq!(
            tree.preorder(NodeId::ROOT),
            vec![NodeId::ROOT, top[0], inner[0], top[1]]
        );
        assert_eq!(tree.descendants(top[0]), vec![inner[0]]);
        assert_eq!(tree.next_id(), NodeId(4));

        assert_eq!(tree.remove_descendants(top[0]), 1);
        assert!(tree.children(top[0]).is_empty());
        assert!(tree.node(inner[0]).is_none());
        assert_eq!(tree.validate(), Ok(()));

        tree.reset_high_water();
        assert_eq!(tree.next_id(), NodeId(3));
    }

    #[test]
    fn validate_detects_broken_links() {
        let d = domain();
        let mut tree = Tree::new();
        let top = tree
            .expand(NodeId::ROOT, vec![Call::bare("a_step").into()], &d)
            .unwrap_or_default();
        if let Some(node) = tree.node_mut(top[0]) {
            node.parent = Some(NodeId(42));
        }
        assert!(matches!(
            tree.validate(),
            Err(TreeError::ParentMismatch { .. } | TreeError::MissingNode(_))
        ));
    }

    #[test]
    fn validate_rejects_a_second_root() {
        let mut tree = Tree::new();
        let stray = tree.graft(NodeId::ROOT, NodeKind::Root);
        assert_eq!(tree.validate(), Err(TreeError::MisplacedRoot(stray)));
    }

    #[test]
    fn snapshot_then_restore() {
        let d = domain();
        let mut tree = Tree::new();
        let top = tree
            .expand(NodeId::ROOT, vec![Call::bare("job").into()], &d)
            .unwrap_or_default();
        let mut live = State::new("live").with("flag", 0, true);
        if let Some(node) = tree.node_mut(top[0]) {
            node.snapshot_or_restore(&mut live);
        }
        live.set("flag", 0, false);
        if let Some(node) = tree.node_mut(top[0]) {
            node.snapshot_or_restore(&mut live);
        }
        assert!(live.holds("flag", &Value::Int(0), &Value::Bool(true)));
    }
}
