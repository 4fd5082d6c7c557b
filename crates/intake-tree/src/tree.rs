//! Arena-style task tree
//!
//! The tree owns every node in an insertion-ordered map keyed by id; children
//! are id references resolved through the arena. There is exactly one writer
//! (the generation coordinator), so no interior locking is needed here.

use crate::artifact::PhaseArtifact;
use crate::error::TreeError;
use crate::node::{NodeId, Phase, PhaseStatus, TaskNode};
use crate::snapshot::{SnapshotNode, TreeSnapshot};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-phase status counts across the whole tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTally {
    /// Nodes not yet started
    pub pending: usize,
    /// Nodes in flight
    pub running: usize,
    /// Nodes finished successfully
    pub completed: usize,
    /// Nodes with exhausted retries
    pub failed: usize,
}

/// Status view of the whole tree, with failed node-phases called out
/// so they are distinguishable and individually retryable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeSummary {
    tallies: [PhaseTally; 3],
    /// Every (node, phase) pair whose retries are exhausted
    pub failed: Vec<(NodeId, Phase)>,
}

impl TreeSummary {
    /// Tally for one phase
    #[inline]
    #[must_use]
    pub fn tally(&self, phase: Phase) -> PhaseTally {
        self.tallies[phase.index()]
    }
}

/// The hierarchical task tree
///
/// Created once per structure-generation call (replacing any previous tree),
/// mutated node-by-node as phases complete, frozen once the wizard completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTree {
    nodes: IndexMap<NodeId, TaskNode>,
    roots: Vec<NodeId>,
    frozen: bool,
}

impl TaskTree {
    /// Install a proposed structure as a fresh tree
    ///
    /// Runs the structural invariants before returning; an invalid snapshot
    /// never becomes a tree. Duplicate ids are all reported, not just the
    /// first one found.
    pub fn install(snapshot: TreeSnapshot) -> Result<Self, TreeError> {
        if snapshot.roots.is_empty() {
            return Err(TreeError::EmptyStructure);
        }

        let mut nodes = IndexMap::new();
        let mut duplicates = Vec::new();
        let mut roots = Vec::with_capacity(snapshot.roots.len());
        for root in snapshot.roots {
            roots.push(root.id);
            Self::insert_subtree(root, &mut nodes, &mut duplicates);
        }
        if !duplicates.is_empty() {
            return Err(TreeError::DuplicateIds(duplicates));
        }

        let tree = Self {
            nodes,
            roots,
            frozen: false,
        };
        tree.validate_invariants()?;
        Ok(tree)
    }

    fn insert_subtree(
        snapshot: SnapshotNode,
        nodes: &mut IndexMap<NodeId, TaskNode>,
        duplicates: &mut Vec<NodeId>,
    ) {
        let mut node = TaskNode::new(snapshot.id, snapshot.label, snapshot.kind);
        node.children = snapshot.children.iter().map(|c| c.id).collect();
        if nodes.insert(snapshot.id, node).is_some() && !duplicates.contains(&snapshot.id) {
            duplicates.push(snapshot.id);
        }
        for child in snapshot.children {
            Self::insert_subtree(child, nodes, duplicates);
        }
    }

    /// Re-check the structural invariants
    ///
    /// Must hold after any structure is installed and before any phase work
    /// starts: every stored id matches its key, every child id resolves, and
    /// every node is reachable exactly once from the roots.
    pub fn validate_invariants(&self) -> Result<(), TreeError> {
        let mismatched: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(key, node)| **key != node.id)
            .map(|(key, _)| *key)
            .collect();
        if !mismatched.is_empty() {
            return Err(TreeError::IdMismatch(mismatched));
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        for root in &self.roots {
            self.visit(*root, None, &mut seen)?;
        }

        if seen.len() != self.nodes.len() {
            let detached: Vec<NodeId> = self
                .nodes
                .keys()
                .filter(|id| !seen.contains(*id))
                .copied()
                .collect();
            return Err(TreeError::DetachedNodes(detached));
        }
        Ok(())
    }

    fn visit(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        seen: &mut HashSet<NodeId>,
    ) -> Result<(), TreeError> {
        let Some(node) = self.nodes.get(&id) else {
            return Err(match parent {
                Some(parent) => TreeError::UnknownChild { parent, child: id },
                None => TreeError::UnknownNode(id),
            });
        };
        if !seen.insert(id) {
            return Err(TreeError::NodeRevisited(id));
        }
        for child in &node.children {
            self.visit(*child, Some(id), seen)?;
        }
        Ok(())
    }

    /// Depth-first preorder walk, parent before children
    ///
    /// This order defines the fan-out iteration order for all phase work and
    /// is the tie-break order for any deterministic scheduling on top.
    #[must_use]
    pub fn flatten(&self) -> Vec<&TaskNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Set one node's phase status
    pub fn set_phase_status(
        &mut self,
        id: NodeId,
        phase: Phase,
        status: PhaseStatus,
    ) -> Result<(), TreeError> {
        self.node_mut(id)?.set_phase_status(phase, status);
        Ok(())
    }

    /// Record in-flight progress for one node phase (forces `Running`)
    pub fn set_phase_progress(
        &mut self,
        id: NodeId,
        phase: Phase,
        percent: u8,
    ) -> Result<(), TreeError> {
        self.node_mut(id)?.set_phase_status(
            phase,
            PhaseStatus::Running {
                progress: percent.min(100),
            },
        );
        Ok(())
    }

    /// Store a generated artifact on its node
    pub fn set_artifact(&mut self, id: NodeId, artifact: PhaseArtifact) -> Result<(), TreeError> {
        self.node_mut(id)?.set_artifact(artifact);
        Ok(())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TaskNode, TreeError> {
        if self.frozen {
            return Err(TreeError::Frozen);
        }
        self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))
    }

    /// Look up one node
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&TaskNode> {
        self.nodes.get(&id)
    }

    /// Top-level node ids, in collection order
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes in the tree
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Make the tree read-only; all mutators fail afterwards
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the tree has been frozen
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Per-phase status counts plus the list of failed node-phases
    #[must_use]
    pub fn phase_summary(&self) -> TreeSummary {
        let mut summary = TreeSummary::default();
        for node in self.flatten() {
            for phase in Phase::ALL {
                let tally = &mut summary.tallies[phase.index()];
                match node.phase_status(phase) {
                    PhaseStatus::Pending => tally.pending += 1,
                    PhaseStatus::Running { .. } => tally.running += 1,
                    PhaseStatus::Completed => tally.completed += 1,
                    PhaseStatus::Failed => {
                        tally.failed += 1;
                        summary.failed.push((node.id, phase));
                    }
                }
            }
        }
        summary
    }

    /// Every (node, phase) pair that blocks global completion
    ///
    /// A pair is a gap unless its status is `Completed` and a non-empty
    /// artifact is stored. Global completion requires this to be empty.
    #[must_use]
    pub fn completion_gaps(&self) -> Vec<(NodeId, Phase)> {
        let mut gaps = Vec::new();
        for node in self.flatten() {
            for phase in Phase::ALL {
                if !node.phase_status(phase).is_completed() || !node.has_artifact(phase) {
                    gaps.push((node.id, phase));
                }
            }
        }
        gaps
    }
}
