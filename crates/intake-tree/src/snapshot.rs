//! Wire shape returned by the external structure generator
//!
//! A snapshot is pure structure: ids, labels, kinds, nesting. Phase state
//! and artifacts exist only on the installed [`crate::TaskTree`].

use crate::node::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// One node of a proposed structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Proposed node id (kept verbatim on install; uniqueness is validated)
    pub id: NodeId,
    /// Display label
    pub label: String,
    /// Semantic kind
    pub kind: NodeKind,
    /// Nested children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    /// Leaf node with a fresh id
    #[must_use]
    pub fn leaf(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Group node with the given children
    #[must_use]
    pub fn group(label: impl Into<String>, children: Vec<SnapshotNode>) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            kind: NodeKind::Group,
            children,
        }
    }

    /// Replace the generated id (test fixtures and resubmissions)
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }
}

/// A proposed task-tree structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Top-level nodes, in collection order
    pub roots: Vec<SnapshotNode>,
}

impl TreeSnapshot {
    /// Snapshot with a single root
    #[must_use]
    pub fn with_root(root: SnapshotNode) -> Self {
        Self { roots: vec![root] }
    }

    /// Total node count across all roots
    #[must_use]
    pub fn node_count(&self) -> usize {
        fn count(node: &SnapshotNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }
}
