//! Intake Progress - phase-level progress aggregation
//!
//! Converts per-node phase completions into:
//! - Phase-level percentages (`Progress` events)
//! - Phase-completion signals (`PhaseComplete` events)
//! - A single, idempotent `AllComplete` signal per generation run
//!
//! Also provides the channel-backed [`ProgressReporter`] handed to generator
//! calls in place of nested progress callbacks.

// Core modules
pub mod aggregator;
pub mod counter;
pub mod reporter;

// Re-exports for convenience
pub use aggregator::{PhaseProgress, ProgressAggregator, ProgressEvent, ProgressSnapshot};
pub use counter::PhaseCounter;
pub use reporter::{ProgressReporter, ProgressUpdate};
