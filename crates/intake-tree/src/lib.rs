//! Intake Tree - hierarchical task tree model
//!
//! The data side of the generation pipeline:
//! - Task nodes with stable, unique identifiers
//! - Per-node, per-phase generation status and progress
//! - Generated artifacts (constraints, extraction contracts, messages)
//! - Structural invariants checked before any phase work starts
//!
//! The tree carries no orchestration behavior; the coordinator in
//! `intake-core` is its single writer.

// Core modules
pub mod artifact;
pub mod error;
pub mod node;
pub mod snapshot;
pub mod tree;

// Re-exports for convenience
pub use artifact::{ConstraintRule, ConstraintSet, ExtractionContract, MessageSet, PhaseArtifact};
pub use error::TreeError;
pub use node::{NodeId, NodeKind, Phase, PhaseStatus, TaskNode};
pub use snapshot::{SnapshotNode, TreeSnapshot};
pub use tree::{PhaseTally, TaskTree, TreeSummary};
