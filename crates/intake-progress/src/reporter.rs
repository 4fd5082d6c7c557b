//! Channel-backed progress reporting
//!
//! Generator calls report 0-100 values through a [`ProgressReporter`] instead
//! of nested callbacks; the coordinator drains the paired receiver. A
//! collaborator that never reports is fine, and so is a receiver that has
//! already gone away (late reports from an abandoned attempt are discarded).

use intake_tree::{NodeId, Phase};
use tokio::sync::mpsc;

/// One in-flight progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Reporting node
    pub node: NodeId,
    /// Reporting phase
    pub phase: Phase,
    /// Reported progress, clamped to 0-100
    pub percent: u8,
}

/// Clonable sender handed to one (node, phase) generator call
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    node: NodeId,
    phase: Phase,
    tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
}

impl ProgressReporter {
    /// Reporter feeding the given channel
    #[must_use]
    pub fn new(node: NodeId, phase: Phase, tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self {
            node,
            phase,
            tx: Some(tx),
        }
    }

    /// Reporter that discards every report (phases with no progress consumer)
    #[must_use]
    pub fn discard(node: NodeId, phase: Phase) -> Self {
        Self {
            node,
            phase,
            tx: None,
        }
    }

    /// The reporting node
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The reporting phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Report progress; 0-100, values above 100 are clamped
    pub fn report(&self, percent: u8) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressUpdate {
                node: self.node,
                phase: self.phase,
                percent: percent.min(100),
            });
        }
    }
}
