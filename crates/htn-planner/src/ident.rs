// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier utilities.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Strongly typed identifier for a node in the decomposition tree.
///
/// Ids are handed out in increasing order and are not reused within one
/// tree, except that replanning lowers the high-water mark to just above the
/// surviving nodes.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: Self = Self(0);

    /// Returns the raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns `true` for [`NodeId::ROOT`].
    #[must_use]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
