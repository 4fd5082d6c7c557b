//! Error types for the generation orchestrator
//!
//! Taxonomy:
//! - Invariant violations ([`intake_tree::TreeError`]) are fatal to the run
//! - Generator failures are retried, then become node-phase state; in the
//!   parallel phase they are never surfaced as errors past the coordinator
//! - Point-of-no-return and bad-transition attempts are rejected at the call
//!   boundary with no side effect

use intake_tree::{NodeId, Phase, TreeError};
use intake_wizard::WizardError;

/// Failure of one opaque generator or finalizer call
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeneratorError {
    /// The remote service could not be reached or timed out
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something unusable
    #[error("malformed generator response: {0}")]
    Malformed(String),

    /// The service refused the input
    #[error("generator rejected input: {0}")]
    Rejected(String),
}

/// Orchestrator-level errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Illegal wizard transition or point-of-no-return violation
    #[error(transparent)]
    Wizard(#[from] WizardError),

    /// Tree invariant violation; the run aborts immediately
    #[error("tree invariant violation: {0}")]
    Tree(#[from] TreeError),

    /// The sequential structure phase failed
    #[error("structure generation failed: {0}")]
    Structure(#[source] GeneratorError),

    /// Finalization failed after a verified-complete run
    #[error("finalization failed: {0}")]
    Finalize(#[source] GeneratorError),

    /// Operation requires an installed structure
    #[error("no structure has been installed")]
    NoTree,

    /// Operation requires an in-flight generation run
    #[error("no generation run is active")]
    NoActiveRun,

    /// Operation addressed a node the tree does not contain
    #[error("unknown node {0}")]
    NodeNotFound(NodeId),

    /// Manual retry addressed a phase that is not terminally failed
    #[error("{phase} phase of node {node} is not failed")]
    PhaseNotFailed {
        /// Addressed node
        node: NodeId,
        /// Addressed phase
        phase: Phase,
    },
}
