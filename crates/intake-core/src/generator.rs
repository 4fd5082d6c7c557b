//! External collaborator interfaces
//!
//! The generator services are opaque remote calls; this core only sees their
//! results. Each phase call receives a [`ProgressReporter`] it may ignore.

use crate::error::GeneratorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use intake_progress::ProgressReporter;
use intake_tree::{ConstraintSet, ExtractionContract, MessageSet, TaskNode, TaskTree, TreeSnapshot};
use serde::Serialize;

/// The generator collaborator, one call type per concern
#[async_trait]
pub trait Generator: Send + Sync {
    /// Propose a task-tree structure for the given input label
    async fn generate_structure(&self, input_label: &str) -> Result<TreeSnapshot, GeneratorError>;

    /// Generate validation rules for one node
    async fn generate_constraints(
        &self,
        node: &TaskNode,
        progress: ProgressReporter,
    ) -> Result<ConstraintSet, GeneratorError>;

    /// Generate the extraction contract for one node
    async fn generate_parser(
        &self,
        node: &TaskNode,
        progress: ProgressReporter,
    ) -> Result<ExtractionContract, GeneratorError>;

    /// Generate dialogue messages for one node
    async fn generate_messages(
        &self,
        node: &TaskNode,
        progress: ProgressReporter,
    ) -> Result<MessageSet, GeneratorError>;
}

/// Handle to the persisted output of one finalized run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedTree {
    /// Host-side reference to the persisted artifact
    pub reference: String,
    /// Nodes persisted
    pub node_count: usize,
    /// Persistence timestamp
    pub persisted_at: DateTime<Utc>,
}

/// The finalization collaborator, invoked exactly once per successful run
#[async_trait]
pub trait Finalizer: Send + Sync {
    /// Persist the fully generated tree
    async fn finalize(&self, tree: &TaskTree) -> Result<PersistedTree, GeneratorError>;
}
