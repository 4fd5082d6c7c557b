//! Generation coordinator
//!
//! Runs the sequential structure phase, gates the parallel phases behind
//! user confirmation, then fans out three generation tasks per node and
//! fans them back in. The coordinator owns the tree and is its single
//! writer: tasks never touch shared state, they hand every progress update
//! and outcome back over channels and the coordinator applies them.

use crate::config::GenerationConfig;
use crate::detector::CompletionDetector;
use crate::error::{GeneratorError, OrchestratorError};
use crate::generator::{Finalizer, Generator};
use intake_progress::{ProgressAggregator, ProgressEvent, ProgressReporter, ProgressSnapshot, ProgressUpdate};
use intake_retry::{RetryExecutor, RetryKey, RetryState};
use intake_tree::{NodeId, Phase, PhaseArtifact, PhaseStatus, TaskNode, TaskTree, TreeSummary};
use intake_wizard::{Wizard, WizardMode};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

type TaskOutcome = (NodeId, Phase, Result<PhaseArtifact, GeneratorError>);

/// Drives one wizard session from proposal to finalization
pub struct GenerationCoordinator {
    config: GenerationConfig,
    generator: Arc<dyn Generator>,
    finalizer: Arc<dyn Finalizer>,
    wizard: Wizard,
    tree: Option<TaskTree>,
    retry: Arc<RetryExecutor>,
    aggregator: Option<Arc<ProgressAggregator>>,
    detector: CompletionDetector,
    generation_started: bool,
    events: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl GenerationCoordinator {
    /// Coordinator over the given collaborators
    #[must_use]
    pub fn new(
        config: GenerationConfig,
        generator: Arc<dyn Generator>,
        finalizer: Arc<dyn Finalizer>,
    ) -> Self {
        Self {
            config,
            generator,
            finalizer,
            wizard: Wizard::new(),
            tree: None,
            retry: Arc::new(RetryExecutor::new(config.retry)),
            aggregator: None,
            detector: CompletionDetector::new(),
            generation_started: false,
            events: None,
        }
    }

    /// Receive phase-level progress events for status displays
    ///
    /// Replaces any previous subscriber. Events are delivered best-effort;
    /// a dropped receiver never stalls generation.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Current wizard mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> WizardMode {
        self.wizard.mode()
    }

    /// The installed tree, if any
    #[inline]
    #[must_use]
    pub fn tree(&self) -> Option<&TaskTree> {
        self.tree.as_ref()
    }

    /// Phase-level progress of the active run
    #[must_use]
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.aggregator.as_ref().map(|a| a.snapshot())
    }

    /// Per-phase status tallies with failed node-phases called out
    #[must_use]
    pub fn summary(&self) -> Option<TreeSummary> {
        self.tree.as_ref().map(TaskTree::phase_summary)
    }

    /// Retry bookkeeping for one (node, phase) pair
    #[must_use]
    pub fn retry_state(&self, node: NodeId, phase: Phase) -> RetryState {
        self.retry.state(RetryKey::new(node, phase))
    }

    /// Phase 1: propose a structure for the given input label
    ///
    /// Sequential and gating: nothing of phase 2 can start until a proposed
    /// structure has been confirmed. Legal from `Start`, `StructureProposed`
    /// (re-proposal) and `StructureCorrection` (resubmission); at or past
    /// `StructureConfirmed` this fails with a point-of-no-return violation
    /// before the generator is ever called. On any failure the previously
    /// installed tree is left untouched.
    pub async fn propose_structure(
        &mut self,
        input_label: &str,
    ) -> Result<&TaskTree, OrchestratorError> {
        self.wizard.ensure_structure_mutable()?;

        tracing::info!(input_label, "requesting structure proposal");
        let snapshot = self
            .generator
            .generate_structure(input_label)
            .await
            .map_err(OrchestratorError::Structure)?;

        // install() validates the structural invariants; an invalid snapshot
        // aborts here, before any phase work exists that could observe it
        let tree = TaskTree::install(snapshot)?;
        tracing::info!(nodes = tree.len(), "structure proposed");

        self.wizard.propose()?;
        Ok(&*self.tree.insert(tree))
    }

    /// User rejected the proposal; await a corrected resubmission
    pub fn request_correction(&mut self) -> Result<(), OrchestratorError> {
        self.wizard.begin_correction()?;
        Ok(())
    }

    /// User confirmed the proposal; the structure becomes immutable
    pub fn confirm_structure(&mut self) -> Result<(), OrchestratorError> {
        if self.tree.is_none() {
            return Err(OrchestratorError::NoTree);
        }
        self.wizard.confirm()?;
        tracing::info!("structure confirmed; point of no return passed");
        Ok(())
    }

    /// Phase 2: fan out constraints/parser/messages generation per node
    ///
    /// Launches `3 x nodeCount` tasks and waits for the entire batch.
    /// Individual failures become `Failed` node-phase state and never abort
    /// sibling work. Calling this again while a run already exists is a
    /// warn-logged no-op, unless the batch is already complete and only
    /// finalization failed: then finalization is retried.
    pub async fn run_generation(&mut self) -> Result<(), OrchestratorError> {
        if self.wizard.mode() == WizardMode::Generating && self.generation_started {
            if self
                .tree
                .as_ref()
                .is_some_and(|tree| tree.completion_gaps().is_empty())
            {
                tracing::info!("batch already complete; retrying finalization");
                return self.finalize_if_complete().await;
            }
            tracing::warn!("generation already running; ignoring re-entrant start");
            return Ok(());
        }
        if self.tree.is_none() {
            return Err(OrchestratorError::NoTree);
        }
        self.wizard.begin_generation()?;
        self.generation_started = true;

        let tree = self.tree.as_mut().ok_or(OrchestratorError::NoTree)?;
        let seeds: Vec<TaskNode> = tree.flatten().into_iter().cloned().collect();

        let aggregator = Arc::new(ProgressAggregator::new(seeds.len()));
        self.aggregator = Some(Arc::clone(&aggregator));

        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        for node in &seeds {
            for phase in Phase::ALL {
                tree.set_phase_status(node.id, phase, PhaseStatus::Running { progress: 0 })?;
                tasks.spawn(Self::run_phase_task(
                    Arc::clone(&self.generator),
                    Arc::clone(&self.retry),
                    node.clone(),
                    phase,
                    ProgressReporter::new(node.id, phase, update_tx.clone()),
                ));
            }
        }
        drop(update_tx);
        tracing::info!(
            nodes = seeds.len(),
            tasks = seeds.len() * Phase::ALL.len(),
            "parallel generation started"
        );

        let all_complete = self.drive(tasks, update_rx, &aggregator).await?;
        tracing::info!("parallel generation batch finished");

        if all_complete {
            self.finalize_if_complete().await?;
        }
        Ok(())
    }

    /// Manually re-run exactly one failed (node, phase) pair
    ///
    /// The only path that can unblock global completion after a terminal
    /// failure; nothing retries automatically. Legal only while `Generating`
    /// and only for a phase whose status is `Failed`. The retry budget for
    /// the pair is restored in full.
    pub async fn retry_node_phase(
        &mut self,
        node_id: NodeId,
        phase: Phase,
    ) -> Result<(), OrchestratorError> {
        if self.wizard.mode() != WizardMode::Generating {
            return Err(OrchestratorError::Wizard(
                intake_wizard::WizardError::InvalidTransition {
                    from: self.wizard.mode(),
                    action: "retry node phase",
                },
            ));
        }
        let aggregator = self
            .aggregator
            .clone()
            .ok_or(OrchestratorError::NoActiveRun)?;
        let tree = self.tree.as_mut().ok_or(OrchestratorError::NoTree)?;
        let node = tree
            .node(node_id)
            .ok_or(OrchestratorError::NodeNotFound(node_id))?
            .clone();
        if !node.phase_status(phase).is_failed() {
            return Err(OrchestratorError::PhaseNotFailed {
                node: node_id,
                phase,
            });
        }

        tracing::info!(node = %node_id, %phase, "manual retry requested");
        self.retry.reset(RetryKey::new(node_id, phase));
        tree.set_phase_status(node_id, phase, PhaseStatus::Running { progress: 0 })?;

        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        tasks.spawn(Self::run_phase_task(
            Arc::clone(&self.generator),
            Arc::clone(&self.retry),
            node,
            phase,
            ProgressReporter::new(node_id, phase, update_tx),
        ));

        let all_complete = self.drive(tasks, update_rx, &aggregator).await?;
        if all_complete {
            self.finalize_if_complete().await?;
        }
        Ok(())
    }

    /// One (node, phase) generation task, routed through the retry executor
    async fn run_phase_task(
        generator: Arc<dyn Generator>,
        retry: Arc<RetryExecutor>,
        node: TaskNode,
        phase: Phase,
        reporter: ProgressReporter,
    ) -> TaskOutcome {
        let key = RetryKey::new(node.id, phase);
        let outcome = retry
            .execute(key, |attempt| {
                let generator = Arc::clone(&generator);
                let node = node.clone();
                let reporter = reporter.clone();
                async move {
                    tracing::trace!(key = %key, attempt, "generation attempt");
                    match phase {
                        Phase::Constraints => generator
                            .generate_constraints(&node, reporter)
                            .await
                            .map(PhaseArtifact::Constraints),
                        Phase::Parser => generator
                            .generate_parser(&node, reporter)
                            .await
                            .map(PhaseArtifact::Parser),
                        Phase::Messages => generator
                            .generate_messages(&node, reporter)
                            .await
                            .map(PhaseArtifact::Messages),
                    }
                }
            })
            .await;
        (node.id, phase, outcome)
    }

    /// Fan-in: apply every progress update and task outcome until the batch
    /// is drained. Returns whether the run's `AllComplete` event fired.
    async fn drive(
        &mut self,
        mut tasks: JoinSet<TaskOutcome>,
        mut update_rx: mpsc::UnboundedReceiver<ProgressUpdate>,
        aggregator: &ProgressAggregator,
    ) -> Result<bool, OrchestratorError> {
        let mut all_complete = false;
        loop {
            tokio::select! {
                Some(update) = update_rx.recv() => self.apply_progress(update),
                joined = tasks.join_next() => match joined {
                    Some(Ok((node, phase, outcome))) => {
                        all_complete |= self.apply_outcome(node, phase, outcome, aggregator)?;
                    }
                    Some(Err(join_error)) => {
                        tracing::error!(error = %join_error, "generation task panicked");
                    }
                    None => break,
                },
            }
        }
        // late reports buffered behind the final outcomes
        while let Ok(update) = update_rx.try_recv() {
            self.apply_progress(update);
        }
        Ok(all_complete)
    }

    fn apply_progress(&mut self, update: ProgressUpdate) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        let Some(node) = tree.node(update.node) else {
            tracing::warn!(node = %update.node, "progress report for unknown node");
            return;
        };
        match node.phase_status(update.phase) {
            // a late report must not reopen a terminal phase
            PhaseStatus::Completed | PhaseStatus::Failed => {}
            PhaseStatus::Pending | PhaseStatus::Running { .. } => {
                if let Err(err) = tree.set_phase_progress(update.node, update.phase, update.percent)
                {
                    tracing::warn!(node = %update.node, error = %err, "dropping progress report");
                }
            }
        }
    }

    /// Apply one terminal task outcome; returns whether `AllComplete` fired
    fn apply_outcome(
        &mut self,
        node: NodeId,
        phase: Phase,
        outcome: Result<PhaseArtifact, GeneratorError>,
        aggregator: &ProgressAggregator,
    ) -> Result<bool, OrchestratorError> {
        let tree = self.tree.as_mut().ok_or(OrchestratorError::NoTree)?;
        match outcome {
            Ok(artifact) => {
                tree.set_artifact(node, artifact)?;
                tree.set_phase_status(node, phase, PhaseStatus::Completed)?;
                let events = aggregator.record_completion(phase);
                let fired = events.contains(&ProgressEvent::AllComplete);
                self.forward_events(events);
                Ok(fired)
            }
            Err(error) => {
                tracing::warn!(node = %node, %phase, %error, "node phase failed permanently");
                tree.set_phase_status(node, phase, PhaseStatus::Failed)?;
                let event = aggregator.record_failure(phase);
                self.forward_events([event]);
                Ok(false)
            }
        }
    }

    async fn finalize_if_complete(&mut self) -> Result<(), OrchestratorError> {
        let tree = self.tree.as_mut().ok_or(OrchestratorError::NoTree)?;
        self.detector
            .check_and_finalize(tree, &mut self.wizard, &*self.finalizer)
            .await?;
        Ok(())
    }

    fn forward_events(&self, events: impl IntoIterator<Item = ProgressEvent>) {
        if let Some(tx) = &self.events {
            for event in events {
                let _ = tx.send(event);
            }
        }
    }
}

impl std::fmt::Debug for GenerationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationCoordinator")
            .field("config", &self.config)
            .field("mode", &self.wizard.mode())
            .field("nodes", &self.tree.as_ref().map(TaskTree::len))
            .field("generation_started", &self.generation_started)
            .field("finalized", &self.detector.fired())
            .finish_non_exhaustive()
    }
}
