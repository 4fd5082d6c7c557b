//! Completion detector
//!
//! The counters say "all complete"; the detector re-derives truth from the
//! tree itself before anything irreversible happens, since counters can be
//! satisfied by stale data in the presence of races. Finalization runs at
//! most once per generation run.

use crate::error::OrchestratorError;
use crate::generator::{Finalizer, PersistedTree};
use intake_tree::TaskTree;
use intake_wizard::{Wizard, WizardMode};

/// Verifies global completion and triggers finalization exactly once
#[derive(Debug, Default)]
pub struct CompletionDetector {
    fired: bool,
}

impl CompletionDetector {
    /// Fresh detector for a new generation run
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this run has already been finalized
    #[inline]
    #[must_use]
    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Evaluate the global completion invariants and finalize if they hold
    ///
    /// Requirements, all re-derived from the tree: every node's three phase
    /// statuses are `Completed`, none is `Failed`, every node carries a
    /// non-empty artifact per phase, and the wizard is still `Generating`.
    /// If any condition is false the incomplete node-phases are logged and
    /// nothing transitions; the wizard stays in `Generating` awaiting manual
    /// retries or further completions.
    pub async fn check_and_finalize(
        &mut self,
        tree: &mut TaskTree,
        wizard: &mut Wizard,
        finalizer: &dyn Finalizer,
    ) -> Result<Option<PersistedTree>, OrchestratorError> {
        if self.fired {
            tracing::debug!("finalization already performed for this run");
            return Ok(None);
        }

        let gaps = tree.completion_gaps();
        if !gaps.is_empty() {
            tracing::warn!(
                gaps = gaps.len(),
                "completion signalled but the tree is not complete"
            );
            for (node, phase) in &gaps {
                tracing::warn!(node = %node, %phase, "incomplete node phase");
            }
            return Ok(None);
        }

        if wizard.mode() != WizardMode::Generating {
            tracing::warn!(mode = %wizard.mode(), "completion signalled outside generating mode");
            return Ok(None);
        }

        let persisted = finalizer
            .finalize(tree)
            .await
            .map_err(OrchestratorError::Finalize)?;
        self.fired = true;
        wizard.complete()?;
        tree.freeze();
        tracing::info!(
            reference = %persisted.reference,
            nodes = persisted.node_count,
            "generation finalized"
        );
        Ok(Some(persisted))
    }
}
