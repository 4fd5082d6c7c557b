//! Testing utilities for the intake workspace
//!
//! Shared fixtures: a scriptable generator collaborator, a call-counting
//! finalizer, and snapshot builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use intake_core::{Finalizer, Generator, GeneratorError, PersistedTree};
use intake_progress::ProgressReporter;
use intake_tree::{
    ConstraintRule, ConstraintSet, ExtractionContract, MessageSet, NodeId, NodeKind, Phase,
    SnapshotNode, TaskNode, TaskTree, TreeSnapshot,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Generator fake driven entirely by per-test scripts.
///
/// Structure calls serve queued snapshots (the last one repeats). Phase calls
/// succeed with plausible artifacts unless a failure budget was scripted for
/// that (label, phase); each failing call consumes one unit of budget.
pub struct ScriptedGenerator {
    snapshots: Mutex<VecDeque<TreeSnapshot>>,
    failures: Mutex<HashMap<(String, Phase), u32>>,
    structure_calls: AtomicUsize,
    phase_calls: Mutex<HashMap<(String, Phase), u32>>,
    progress_steps: Vec<u8>,
}

impl ScriptedGenerator {
    pub fn new(snapshot: TreeSnapshot) -> Self {
        Self::with_snapshots(vec![snapshot])
    }

    pub fn with_snapshots(snapshots: Vec<TreeSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into_iter().collect()),
            failures: Mutex::new(HashMap::new()),
            structure_calls: AtomicUsize::new(0),
            phase_calls: Mutex::new(HashMap::new()),
            progress_steps: vec![50, 100],
        }
    }

    /// Make the next `times` calls for `(label, phase)` fail.
    #[must_use]
    pub fn with_failures(self, label: &str, phase: Phase, times: u32) -> Self {
        self.failures
            .lock()
            .insert((label.to_string(), phase), times);
        self
    }

    /// Progress values reported before each successful phase call returns.
    #[must_use]
    pub fn with_progress_steps(mut self, steps: Vec<u8>) -> Self {
        self.progress_steps = steps;
        self
    }

    pub fn structure_calls(&self) -> usize {
        self.structure_calls.load(Ordering::SeqCst)
    }

    pub fn phase_calls(&self, label: &str, phase: Phase) -> u32 {
        self.phase_calls
            .lock()
            .get(&(label.to_string(), phase))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_phase_calls(&self) -> u32 {
        self.phase_calls.lock().values().sum()
    }

    fn before_phase_call(
        &self,
        node: &TaskNode,
        phase: Phase,
        progress: &ProgressReporter,
    ) -> Result<(), GeneratorError> {
        *self
            .phase_calls
            .lock()
            .entry((node.label.clone(), phase))
            .or_insert(0) += 1;

        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(&(node.label.clone(), phase)) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(GeneratorError::Unavailable(format!(
                    "scripted failure for {}/{phase}",
                    node.label
                )));
            }
        }
        drop(failures);

        for step in &self.progress_steps {
            progress.report(*step);
        }
        Ok(())
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate_structure(&self, _input_label: &str) -> Result<TreeSnapshot, GeneratorError> {
        self.structure_calls.fetch_add(1, Ordering::SeqCst);
        let mut snapshots = self.snapshots.lock();
        if snapshots.len() > 1 {
            Ok(snapshots.pop_front().unwrap())
        } else {
            snapshots
                .front()
                .cloned()
                .ok_or_else(|| GeneratorError::Unavailable("no scripted snapshot".into()))
        }
    }

    async fn generate_constraints(
        &self,
        node: &TaskNode,
        progress: ProgressReporter,
    ) -> Result<ConstraintSet, GeneratorError> {
        self.before_phase_call(node, Phase::Constraints, &progress)?;
        Ok(ConstraintSet {
            rules: vec![ConstraintRule {
                rule: "required".into(),
                argument: None,
                error_message: format!("{} is required", node.label),
            }],
        })
    }

    async fn generate_parser(
        &self,
        node: &TaskNode,
        progress: ProgressReporter,
    ) -> Result<ExtractionContract, GeneratorError> {
        self.before_phase_call(node, Phase::Parser, &progress)?;
        Ok(ExtractionContract {
            variable: node.label.replace(' ', "_"),
            expression: format!("extract({})", node.kind),
        })
    }

    async fn generate_messages(
        &self,
        node: &TaskNode,
        progress: ProgressReporter,
    ) -> Result<MessageSet, GeneratorError> {
        self.before_phase_call(node, Phase::Messages, &progress)?;
        Ok(MessageSet {
            prompt: format!("Please provide {}", node.label),
            reprompt: Some(format!("Sorry, I still need {}", node.label)),
            confirmation: None,
        })
    }
}

/// Finalizer fake that counts invocations and can fail a scripted number
/// of times before succeeding.
#[derive(Default)]
pub struct CountingFinalizer {
    calls: AtomicUsize,
    failures: AtomicUsize,
}

impl CountingFinalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalizer whose first `times` calls fail.
    #[must_use]
    pub fn failing(times: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(times),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Finalizer for CountingFinalizer {
    async fn finalize(&self, tree: &TaskTree) -> Result<PersistedTree, GeneratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(GeneratorError::Unavailable(
                "scripted finalize failure".into(),
            ));
        }
        Ok(PersistedTree {
            reference: format!("persisted-{call}"),
            node_count: tree.len(),
            persisted_at: Utc::now(),
        })
    }
}

/// One leaf per label, no nesting.
pub fn flat_snapshot(labels: &[&str]) -> TreeSnapshot {
    TreeSnapshot {
        roots: labels
            .iter()
            .map(|label| SnapshotNode::leaf(*label, NodeKind::Text))
            .collect(),
    }
}

/// A small realistic booking tree: 5 nodes over 3 levels.
pub fn nested_snapshot() -> TreeSnapshot {
    TreeSnapshot::with_root(SnapshotNode::group(
        "booking",
        vec![
            SnapshotNode::leaf("name", NodeKind::Text),
            SnapshotNode::group(
                "travel",
                vec![
                    SnapshotNode::leaf("departure", NodeKind::Date),
                    SnapshotNode::leaf("passengers", NodeKind::Number),
                ],
            ),
        ],
    ))
}

/// Two siblings sharing one id; install must reject this.
pub fn duplicate_id_snapshot() -> TreeSnapshot {
    let dup = NodeId::new();
    TreeSnapshot {
        roots: vec![SnapshotNode::group(
            "root",
            vec![
                SnapshotNode::leaf("a", NodeKind::Text).with_id(dup),
                SnapshotNode::leaf("b", NodeKind::Text).with_id(dup),
            ],
        )],
    }
}
