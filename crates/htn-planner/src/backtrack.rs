// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Chronological backtracking over the decomposition tree.
use tracing::{debug, warn};

use crate::engine_impl::Planner;
use crate::ident::NodeId;
use crate::tree::Status;

impl Planner {
    /// Recovers from the failure of `failed` (an open child of `focus`) and
    /// returns the node the search should scan next.
    ///
    /// The failed node is rewound to its first candidate. Then the subtree
    /// under `focus` is walked in reverse pre-order, reopening closed nodes
    /// until one with children is found: its subtree is discarded and its
    /// parent becomes the new focus, so the reopened node resumes from its
    /// own cursor and snapshot. Childless closed nodes passed on the way are
    /// reopened and lose their snapshot. When nothing qualifies the whole
    /// tree is pruned back to the root and the search ends with no plan.
    pub(crate) fn backtrack(&mut self, focus: NodeId, failed: NodeId) -> NodeId {
        if let Some(node) = self.tree.node_mut(failed) {
            node.status = Status::Open;
            if let Some(dec) = node.decomposition.as_mut() {
                dec.reset();
            }
        }

        for id in self.tree.preorder(focus).into_iter().rev() {
            let Some(node) = self.tree.node_mut(id) else {
                continue;
            };
            if node.status != Status::Closed {
                continue;
            }
            node.status = Status::Open;
            if node.children().is_empty() {
                if let Some(dec) = node.decomposition.as_mut() {
                    dec.snapshot = None;
                }
                continue;
            }
            let removed = self.tree.remove_descendants(id);
            let resume = self.tree.parent(id).unwrap_or(NodeId::ROOT);
            debug!(failed = %failed, reopened = %id, removed, focus = %resume, "backtracked");
            return resume;
        }

        let removed = self.tree.remove_descendants(NodeId::ROOT);
        warn!(failed = %failed, removed, "no alternatives left; search exhausted");
        NodeId::ROOT
    }
}
