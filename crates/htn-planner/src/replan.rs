// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Replanning after an execution failure.
//!
//! Everything that precedes the failed action in pre-order is kept as
//! committed history (tagged [`Tag::Old`]); the failed action and everything
//! after it is reopened and the search resumes by backtracking from the
//! failure. Only actions produced by the resumed search are returned.
use tracing::{debug, info, instrument};

use crate::engine_impl::{PlanError, Planner};
use crate::ident::NodeId;
use crate::payload::Call;
use crate::state::State;
use crate::tree::{Node, NodeKind, Status, Tag};

impl Planner {
    /// Repairs the most recent plan after the action at `failed` could not
    /// be executed in `state`.
    ///
    /// `state` is the world as observed just before the failed action. The
    /// returned plan replaces the failed action and every action after it;
    /// it is empty when no repair exists.
    ///
    /// # Errors
    /// [`PlanError::NoSolutionTree`] before any `plan` call,
    /// [`PlanError::UnknownNode`] / [`PlanError::NotAnAction`] for a bad
    /// `failed` id, plus anything [`Planner::plan`] can return.
    #[instrument(skip_all, fields(state = state.name(), failed = %failed))]
    pub fn replan(&mut self, state: &State, failed: NodeId) -> Result<Vec<Call>, PlanError> {
        if !self.planned {
            return Err(PlanError::NoSolutionTree);
        }
        let node = self.tree.node(failed).ok_or(PlanError::UnknownNode(failed))?;
        if node.kind() != NodeKind::Action {
            return Err(PlanError::NotAnAction(failed));
        }
        info!("replanning");

        self.state = state.clone();
        self.iterations = 0;
        self.truncate_from(failed);
        self.tree.reset_high_water();
        self.commit_history();

        let parent = self.tree.parent(failed).unwrap_or(NodeId::ROOT);
        let focus = self.backtrack(parent, failed);
        self.search(focus)?;
        let plan = self.extract(Some(Tag::New))?;
        info!(
            actions = plan.len(),
            iterations = self.iterations,
            "replanning finished"
        );
        Ok(plan)
    }

    /// Reopens every node from the end of the pre-order walk back to and
    /// including `failed`, tagging each as new and discarding the subtrees
    /// of decomposable ones.
    fn truncate_from(&mut self, failed: NodeId) {
        let mut reopened = 0_usize;
        for id in self.tree.preorder(NodeId::ROOT).into_iter().rev() {
            let Some(node) = self.tree.node_mut(id) else {
                continue;
            };
            node.status = Status::Open;
            node.tag = Tag::New;
            if let Some(dec) = node.decomposition.as_mut() {
                dec.reset();
                self.tree.remove_descendants(id);
            }
            reopened += 1;
            if id == failed {
                break;
            }
        }
        debug!(reopened, "truncated tree after failure");
    }

    /// Re-seeds surviving snapshots with the observed state and marks every
    /// closed node as history.
    fn commit_history(&mut self) {
        let ids: Vec<NodeId> = self.tree.iter().map(Node::id).collect();
        for id in ids {
            let Some(node) = self.tree.node_mut(id) else {
                continue;
            };
            let closed = node.status == Status::Closed;
            if let Some(dec) = node.decomposition.as_mut() {
                dec.snapshot = closed.then(|| self.state.clone());
            }
            if closed {
                node.tag = Tag::Old;
            }
        }
    }
}
