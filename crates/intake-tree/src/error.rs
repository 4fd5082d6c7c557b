//! Error types for the tree model
//!
//! Invariant violations are fatal to the generation run that observed them;
//! the error always names every violating node.

use crate::node::NodeId;

/// Tree model errors
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The same id appears on more than one node in an incoming structure
    #[error("duplicate node ids: {}", format_ids(.0))]
    DuplicateIds(Vec<NodeId>),

    /// A stored node's id no longer matches the id it was installed under
    #[error("node ids changed after install: {}", format_ids(.0))]
    IdMismatch(Vec<NodeId>),

    /// A parent references a child id that is not in the tree
    #[error("node {parent} references unknown child {child}")]
    UnknownChild {
        /// Referencing parent
        parent: NodeId,
        /// Missing child id
        child: NodeId,
    },

    /// A node is reachable through more than one parent (shared child or cycle)
    #[error("node {0} is reachable more than once")]
    NodeRevisited(NodeId),

    /// Installed nodes not reachable from any root
    #[error("detached nodes: {}", format_ids(.0))]
    DetachedNodes(Vec<NodeId>),

    /// Operation addressed an id this tree does not contain
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The structure generator returned a tree with no nodes
    #[error("structure has no nodes")]
    EmptyStructure,

    /// Mutation attempted after the tree was frozen
    #[error("tree is frozen")]
    Frozen,
}

fn format_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_error_names_every_offender() {
        let a = NodeId::new();
        let b = NodeId::new();
        let err = TreeError::DuplicateIds(vec![a, b]);
        let msg = err.to_string();
        assert!(msg.contains(&a.to_string()));
        assert!(msg.contains(&b.to_string()));
    }
}
