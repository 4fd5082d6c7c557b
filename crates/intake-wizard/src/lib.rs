//! Intake Wizard - the outer mode state machine
//!
//! Gates which orchestrator operations are legal:
//!
//! ```text
//! Start -> StructureProposed -> StructureConfirmed -> Generating -> Completed
//!             |        ^
//!             v        |
//!          StructureCorrection
//! ```
//!
//! `StructureConfirmed` is the point of no return: from there on, any attempt
//! to re-run structure generation is rejected before it can have a side
//! effect. The mode is a single sum type matched exhaustively at every
//! consumer; no derived boolean flags can disagree with it.

use serde::{Deserialize, Serialize};

/// Wizard mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardMode {
    /// Nothing proposed yet
    Start,
    /// A structure awaits user confirmation or correction
    StructureProposed,
    /// User rejected the proposal; awaiting resubmission
    StructureCorrection,
    /// User confirmed; structure is immutable from here on
    StructureConfirmed,
    /// Parallel phase generation in flight
    Generating,
    /// Generation finalized; the tree is frozen
    Completed,
}

impl WizardMode {
    /// Whether structure generation may still (re)run in this mode
    #[inline]
    #[must_use]
    pub fn structure_mutable(self) -> bool {
        matches!(
            self,
            Self::Start | Self::StructureProposed | Self::StructureCorrection
        )
    }
}

impl std::fmt::Display for WizardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::StructureProposed => "structure_proposed",
            Self::StructureCorrection => "structure_correction",
            Self::StructureConfirmed => "structure_confirmed",
            Self::Generating => "generating",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// State machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    /// Structure work attempted at or past `StructureConfirmed`
    #[error("structure is locked in mode {mode}: confirmation is a point of no return")]
    PointOfNoReturn {
        /// Mode at the time of the attempt
        mode: WizardMode,
    },

    /// A transition that the mode graph does not allow
    #[error("cannot {action} from mode {from}")]
    InvalidTransition {
        /// Mode at the time of the attempt
        from: WizardMode,
        /// Attempted operation
        action: &'static str,
    },
}

/// The wizard state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wizard {
    mode: WizardMode,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// Fresh wizard in `Start`
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: WizardMode::Start,
        }
    }

    /// Current mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    /// Check that structure generation is still legal, with no side effect
    ///
    /// Callers must run this before invoking the structure generator so that
    /// a rejected call leaves no trace.
    pub fn ensure_structure_mutable(&self) -> Result<(), WizardError> {
        let mode = self.mode();
        if mode.structure_mutable() {
            Ok(())
        } else {
            Err(WizardError::PointOfNoReturn { mode })
        }
    }

    fn transition(
        &mut self,
        action: &'static str,
        allowed: &[WizardMode],
        to: WizardMode,
    ) -> Result<(), WizardError> {
        let from = self.mode();
        if !allowed.contains(&from) {
            return Err(WizardError::InvalidTransition { from, action });
        }
        tracing::debug!(%from, %to, action, "wizard transition");
        self.mode = to;
        Ok(())
    }

    /// Structure generation succeeded; await user confirmation
    ///
    /// Legal from `Start`, from `StructureProposed` (re-proposal) and from
    /// `StructureCorrection` (resubmission).
    pub fn propose(&mut self) -> Result<(), WizardError> {
        self.ensure_structure_mutable()?;
        self.transition(
            "propose structure",
            &[
                WizardMode::Start,
                WizardMode::StructureProposed,
                WizardMode::StructureCorrection,
            ],
            WizardMode::StructureProposed,
        )
    }

    /// User rejected the proposed structure
    pub fn begin_correction(&mut self) -> Result<(), WizardError> {
        self.transition(
            "begin correction",
            &[WizardMode::StructureProposed],
            WizardMode::StructureCorrection,
        )
    }

    /// User confirmed the proposed structure; point of no return
    pub fn confirm(&mut self) -> Result<(), WizardError> {
        self.transition(
            "confirm structure",
            &[WizardMode::StructureProposed],
            WizardMode::StructureConfirmed,
        )
    }

    /// The coordinator starts the parallel generation phases
    pub fn begin_generation(&mut self) -> Result<(), WizardError> {
        self.transition(
            "begin generation",
            &[WizardMode::StructureConfirmed],
            WizardMode::Generating,
        )
    }

    /// The completion detector verified the run and finalized it
    pub fn complete(&mut self) -> Result<(), WizardError> {
        self.transition(
            "complete",
            &[WizardMode::Generating],
            WizardMode::Completed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.mode(), WizardMode::Start);
        wizard.propose().unwrap();
        wizard.confirm().unwrap();
        wizard.begin_generation().unwrap();
        wizard.complete().unwrap();
        assert_eq!(wizard.mode(), WizardMode::Completed);
    }

    #[test]
    fn correction_loop() {
        let mut wizard = Wizard::new();
        wizard.propose().unwrap();
        wizard.begin_correction().unwrap();
        assert_eq!(wizard.mode(), WizardMode::StructureCorrection);
        wizard.propose().unwrap();
        assert_eq!(wizard.mode(), WizardMode::StructureProposed);
    }

    #[test]
    fn correction_only_from_proposed() {
        let mut wizard = Wizard::new();
        assert!(matches!(
            wizard.begin_correction(),
            Err(WizardError::InvalidTransition { .. })
        ));
        wizard.propose().unwrap();
        wizard.confirm().unwrap();
        assert!(matches!(
            wizard.begin_correction(),
            Err(WizardError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn point_of_no_return_after_confirmation() {
        let mut wizard = Wizard::new();
        wizard.propose().unwrap();
        wizard.confirm().unwrap();

        for _ in 0..2 {
            assert_eq!(
                wizard.ensure_structure_mutable(),
                Err(WizardError::PointOfNoReturn {
                    mode: wizard.mode()
                })
            );
            assert!(wizard.propose().is_err());
            wizard
                .begin_generation()
                .or_else(|_| wizard.complete())
                .unwrap();
        }
        assert_eq!(wizard.mode(), WizardMode::Completed);
        assert!(wizard.propose().is_err());
    }

    #[test]
    fn default_starts_at_start() {
        assert_eq!(Wizard::default().mode(), WizardMode::Start);
    }
}
