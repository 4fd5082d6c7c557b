//! Per-phase completion counter
//!
//! `total` is fixed at tree-flatten time; `completed` only moves through an
//! atomic fetch-and-increment. Failures never increment.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Completion counter for one phase
#[derive(Debug)]
pub struct PhaseCounter {
    completed: AtomicUsize,
    total: usize,
}

impl PhaseCounter {
    /// Counter for `total` nodes
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one node completion, returning the new completed count
    ///
    /// Atomic compare-and-swap loop so concurrent notifiers can never push
    /// the count past `total`; an over-count is logged and ignored.
    pub fn record_completion(&self) -> usize {
        let updated = self
            .completed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |completed| {
                (completed < self.total).then_some(completed + 1)
            });
        match updated {
            Ok(previous) => previous + 1,
            Err(saturated) => {
                tracing::error!(
                    total = self.total,
                    "completion recorded past total; ignoring"
                );
                saturated
            }
        }
    }

    /// Completed count
    #[inline]
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Fixed total
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Rounded percentage, 0-100
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent_of(self.completed(), self.total)
    }

    /// Whether every node has completed this phase
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total
    }
}

/// `round(100 * completed / total)`, half-up
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
#[must_use]
pub(crate) fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (100.0 * completed as f64 / total as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_to_total() {
        let counter = PhaseCounter::new(3);
        assert_eq!(counter.record_completion(), 1);
        assert_eq!(counter.record_completion(), 2);
        assert!(!counter.is_complete());
        assert_eq!(counter.record_completion(), 3);
        assert!(counter.is_complete());
    }

    #[test]
    fn never_exceeds_total() {
        let counter = PhaseCounter::new(1);
        counter.record_completion();
        assert_eq!(counter.record_completion(), 1);
        assert_eq!(counter.completed(), 1);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(0, 3), 0);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(3, 3), 100);
        assert_eq!(percent_of(1, 8), 13);
    }
}
