//! Node types for the task tree
//!
//! Defines the fundamental per-node vocabulary:
//! - Stable node identifiers (ULID for sortability)
//! - Semantic node kinds
//! - The three generation phases and their per-node status

use crate::artifact::{ConstraintSet, ExtractionContract, MessageSet, PhaseArtifact};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique node identifier (ULID for sortability)
///
/// Generated once when a node enters the tree and never reassigned; the
/// tree-level invariants enforce uniqueness and stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Ulid);

impl NodeId {
    /// Generate new node ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic kind of the datum a node collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Free text
    Text,
    /// Numeric value
    Number,
    /// Yes/no
    Boolean,
    /// Calendar date
    Date,
    /// One of a fixed set of options
    Choice,
    /// Composite node whose children are collected individually
    Group,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Choice => "choice",
            Self::Group => "group",
        };
        write!(f, "{s}")
    }
}

/// One of the three independent generation concerns applied per node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Validation-rule generation
    Constraints,
    /// Extraction-parser generation
    Parser,
    /// Dialogue-message generation
    Messages,
}

impl Phase {
    /// All phases, in counter/display order
    pub const ALL: [Phase; 3] = [Phase::Constraints, Phase::Parser, Phase::Messages];

    /// Stable index for per-phase arrays
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Constraints => 0,
            Self::Parser => 1,
            Self::Messages => 2,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Constraints => "constraints",
            Self::Parser => "parser",
            Self::Messages => "messages",
        };
        write!(f, "{s}")
    }
}

/// Per-node status of one generation phase
///
/// Progress is only representable while `Running`; a node can never carry a
/// stale percentage in a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum PhaseStatus {
    /// Generation not yet started
    Pending,
    /// Generation in flight
    Running {
        /// Last reported progress, 0-100
        progress: u8,
    },
    /// Generation succeeded and the artifact is stored
    Completed,
    /// Retries exhausted; blocks global completion until manually retried
    Failed,
}

impl PhaseStatus {
    /// Whether this phase finished successfully
    #[inline]
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether this phase exhausted its retries
    #[inline]
    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running { progress } => write!(f, "running ({progress}%)"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Per-phase artifact slots for one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct ArtifactSlots {
    pub(crate) constraints: Option<ConstraintSet>,
    pub(crate) parser: Option<ExtractionContract>,
    pub(crate) messages: Option<MessageSet>,
}

/// One entry in the task tree: a piece of information to collect,
/// possibly with sub-items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    /// Stable unique identifier
    pub id: NodeId,
    /// Display label
    pub label: String,
    /// Semantic kind
    pub kind: NodeKind,
    /// Ordered child ids (resolved through the owning tree)
    pub children: Vec<NodeId>,
    statuses: [PhaseStatus; 3],
    artifacts: ArtifactSlots,
}

impl TaskNode {
    /// Create a fresh node with all phases pending
    #[must_use]
    pub fn new(id: NodeId, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            children: Vec::new(),
            statuses: [PhaseStatus::Pending; 3],
            artifacts: ArtifactSlots::default(),
        }
    }

    /// Status of one phase
    #[inline]
    #[must_use]
    pub fn phase_status(&self, phase: Phase) -> PhaseStatus {
        self.statuses[phase.index()]
    }

    pub(crate) fn set_phase_status(&mut self, phase: Phase, status: PhaseStatus) {
        self.statuses[phase.index()] = status;
    }

    pub(crate) fn set_artifact(&mut self, artifact: PhaseArtifact) {
        match artifact {
            PhaseArtifact::Constraints(set) => self.artifacts.constraints = Some(set),
            PhaseArtifact::Parser(contract) => self.artifacts.parser = Some(contract),
            PhaseArtifact::Messages(set) => self.artifacts.messages = Some(set),
        }
    }

    /// Generated validation rules, if that phase has produced them
    #[inline]
    #[must_use]
    pub fn constraints(&self) -> Option<&ConstraintSet> {
        self.artifacts.constraints.as_ref()
    }

    /// Generated extraction contract, if that phase has produced it
    #[inline]
    #[must_use]
    pub fn parser(&self) -> Option<&ExtractionContract> {
        self.artifacts.parser.as_ref()
    }

    /// Generated dialogue messages, if that phase has produced them
    #[inline]
    #[must_use]
    pub fn messages(&self) -> Option<&MessageSet> {
        self.artifacts.messages.as_ref()
    }

    /// Whether a non-empty artifact exists for the given phase
    #[must_use]
    pub fn has_artifact(&self, phase: Phase) -> bool {
        match phase {
            Phase::Constraints => self
                .artifacts
                .constraints
                .as_ref()
                .is_some_and(|a| !a.is_empty()),
            Phase::Parser => self.artifacts.parser.as_ref().is_some_and(|a| !a.is_empty()),
            Phase::Messages => self
                .artifacts
                .messages
                .as_ref()
                .is_some_and(|a| !a.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MessageSet;

    #[test]
    fn node_id_generation() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn phase_index_is_stable() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn fresh_node_is_pending_everywhere() {
        let node = TaskNode::new(NodeId::new(), "name", NodeKind::Text);
        for phase in Phase::ALL {
            assert_eq!(node.phase_status(phase), PhaseStatus::Pending);
            assert!(!node.has_artifact(phase));
        }
    }

    #[test]
    fn empty_artifact_does_not_count() {
        let mut node = TaskNode::new(NodeId::new(), "name", NodeKind::Text);
        node.set_artifact(PhaseArtifact::Messages(MessageSet::default()));
        assert!(!node.has_artifact(Phase::Messages));

        node.set_artifact(PhaseArtifact::Messages(MessageSet::prompt_only(
            "What is your name?",
        )));
        assert!(node.has_artifact(Phase::Messages));
    }
}
