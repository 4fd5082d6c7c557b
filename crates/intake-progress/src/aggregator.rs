//! Progress aggregator
//!
//! One [`PhaseCounter`] per phase. Completion notifications produce phase
//! progress or phase-complete events; once all three phases are complete a
//! single `AllComplete` event is emitted, guarded by a compare-and-swap so
//! re-observations of the condition can never re-trigger finalization.

use crate::counter::{percent_of, PhaseCounter};
use intake_tree::Phase;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Aggregated progress signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum ProgressEvent {
    /// A phase advanced but is not yet complete
    Progress {
        /// The phase that advanced
        phase: Phase,
        /// Rounded percentage, 0-100
        percent: u8,
        /// Completed node count
        completed: usize,
        /// Fixed node total
        total: usize,
    },
    /// Every node finished this phase
    PhaseComplete {
        /// The completed phase
        phase: Phase,
    },
    /// All three phases are simultaneously complete (fired at most once)
    AllComplete,
}

/// Point-in-time progress of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseProgress {
    /// The phase
    pub phase: Phase,
    /// Completed node count
    pub completed: usize,
    /// Fixed node total
    pub total: usize,
    /// Rounded percentage
    pub percent: u8,
    /// Whether the phase is complete
    pub complete: bool,
}

/// Point-in-time view across all phases, for host status displays
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// Per-phase progress, in [`Phase::ALL`] order
    pub phases: [PhaseProgress; 3],
    /// Rounded percentage across all phases
    pub overall: u8,
}

/// Tracks phase counters for one generation run
#[derive(Debug)]
pub struct ProgressAggregator {
    counters: [PhaseCounter; 3],
    all_complete_fired: AtomicBool,
}

impl ProgressAggregator {
    /// Aggregator for a run over `total_nodes` nodes
    #[must_use]
    pub fn new(total_nodes: usize) -> Self {
        Self {
            counters: [
                PhaseCounter::new(total_nodes),
                PhaseCounter::new(total_nodes),
                PhaseCounter::new(total_nodes),
            ],
            all_complete_fired: AtomicBool::new(false),
        }
    }

    fn counter(&self, phase: Phase) -> &PhaseCounter {
        &self.counters[phase.index()]
    }

    /// Record one node-phase completion
    ///
    /// Returns the events this completion produced: a `Progress` event, or a
    /// `PhaseComplete` event possibly followed by the run's single
    /// `AllComplete` event.
    pub fn record_completion(&self, phase: Phase) -> Vec<ProgressEvent> {
        let counter = self.counter(phase);
        let completed = counter.record_completion();
        let total = counter.total();

        if completed < total {
            let percent = percent_of(completed, total);
            tracing::debug!(%phase, percent, completed, total, "phase progress");
            return vec![ProgressEvent::Progress {
                phase,
                percent,
                completed,
                total,
            }];
        }

        tracing::info!(%phase, total, "phase complete");
        let mut events = vec![ProgressEvent::PhaseComplete { phase }];
        if self.counters.iter().all(PhaseCounter::is_complete)
            && !self.all_complete_fired.swap(true, Ordering::SeqCst)
        {
            tracing::info!("all phases complete");
            events.push(ProgressEvent::AllComplete);
        }
        events
    }

    /// Record one node-phase terminal failure
    ///
    /// Does not increment anything: the phase total stays unreachable until
    /// an out-of-band retry succeeds. Re-emits the current percentage so
    /// status views refresh.
    pub fn record_failure(&self, phase: Phase) -> ProgressEvent {
        let counter = self.counter(phase);
        tracing::warn!(
            %phase,
            completed = counter.completed(),
            total = counter.total(),
            "node phase failed; completion blocked until manual retry"
        );
        ProgressEvent::Progress {
            phase,
            percent: counter.percent(),
            completed: counter.completed(),
            total: counter.total(),
        }
    }

    /// Completed count for one phase
    #[must_use]
    pub fn completed(&self, phase: Phase) -> usize {
        self.counter(phase).completed()
    }

    /// Fixed total for one phase
    #[must_use]
    pub fn total(&self, phase: Phase) -> usize {
        self.counter(phase).total()
    }

    /// Rounded percentage for one phase
    #[must_use]
    pub fn percent(&self, phase: Phase) -> u8 {
        self.counter(phase).percent()
    }

    /// Whether one phase is complete
    #[must_use]
    pub fn is_phase_complete(&self, phase: Phase) -> bool {
        self.counter(phase).is_complete()
    }

    /// Whether all three phases are complete
    #[must_use]
    pub fn is_all_complete(&self) -> bool {
        self.counters.iter().all(PhaseCounter::is_complete)
    }

    /// Whether the run's `AllComplete` event has already been emitted
    #[must_use]
    pub fn all_complete_fired(&self) -> bool {
        self.all_complete_fired.load(Ordering::SeqCst)
    }

    /// Point-in-time view across all phases
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let phases = Phase::ALL.map(|phase| {
            let counter = self.counter(phase);
            PhaseProgress {
                phase,
                completed: counter.completed(),
                total: counter.total(),
                percent: counter.percent(),
                complete: counter.is_complete(),
            }
        });
        let completed: usize = phases.iter().map(|p| p.completed).sum();
        let total: usize = phases.iter().map(|p| p.total).sum();
        ProgressSnapshot {
            phases,
            overall: percent_of(completed, total),
        }
    }
}
