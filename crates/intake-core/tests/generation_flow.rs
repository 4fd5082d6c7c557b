//! Functional tests for the parallel generation run.
//!
//! Core guarantees exercised here:
//! - A clean run drives the wizard Generating -> Completed and calls
//!   finalize exactly once.
//! - A node-phase that exhausts its retries blocks global completion while
//!   the sibling phases still reach 100%; a manual retry of exactly that
//!   pair unblocks the run.
//! - Re-entrant generation starts are idempotent no-ops.
//! - A transient finalizer failure is recoverable: re-running generation on
//!   a complete batch retries finalization instead of wedging the session.
//! - Phase-level events reach a subscriber, with a single AllComplete.

use intake_core::{
    Finalizer, GenerationConfig, GenerationCoordinator, Generator, OrchestratorError,
};
use intake_progress::ProgressEvent;
use intake_retry::RetryStatus;
use intake_test_utils::{flat_snapshot, nested_snapshot, CountingFinalizer, ScriptedGenerator};
use intake_tree::{NodeId, Phase, PhaseStatus};
use intake_wizard::WizardMode;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio_test::assert_ok;

fn coordinator(
    generator: ScriptedGenerator,
) -> (
    GenerationCoordinator,
    Arc<ScriptedGenerator>,
    Arc<CountingFinalizer>,
) {
    coordinator_with_finalizer(generator, CountingFinalizer::new())
}

fn coordinator_with_finalizer(
    generator: ScriptedGenerator,
    finalizer: CountingFinalizer,
) -> (
    GenerationCoordinator,
    Arc<ScriptedGenerator>,
    Arc<CountingFinalizer>,
) {
    let generator = Arc::new(generator);
    let finalizer = Arc::new(finalizer);
    let coordinator = GenerationCoordinator::new(
        GenerationConfig::new(),
        Arc::clone(&generator) as Arc<dyn Generator>,
        Arc::clone(&finalizer) as Arc<dyn Finalizer>,
    );
    (coordinator, generator, finalizer)
}

fn node_id_by_label(coordinator: &GenerationCoordinator, label: &str) -> NodeId {
    coordinator
        .tree()
        .expect("tree installed")
        .flatten()
        .into_iter()
        .find(|n| n.label == label)
        .expect("label present")
        .id
}

#[tokio::test]
async fn single_node_run_completes_and_finalizes_once() {
    let (mut coordinator, _generator, finalizer) =
        coordinator(ScriptedGenerator::new(flat_snapshot(&["name"])));

    coordinator.propose_structure("collect a name").await.unwrap();
    assert_eq!(coordinator.mode(), WizardMode::StructureProposed);
    coordinator.confirm_structure().unwrap();
    tokio_test::assert_ok!(coordinator.run_generation().await);

    assert_eq!(coordinator.mode(), WizardMode::Completed);
    assert_eq!(finalizer.calls(), 1);

    let tree = coordinator.tree().unwrap();
    assert!(tree.is_frozen());
    let node = tree.flatten()[0];
    for phase in Phase::ALL {
        assert_eq!(node.phase_status(phase), PhaseStatus::Completed);
        assert!(node.has_artifact(phase));
    }
    assert_eq!(coordinator.progress().unwrap().overall, 100);
}

#[tokio::test]
async fn full_tree_artifacts_land_on_their_nodes() {
    let (mut coordinator, _generator, finalizer) =
        coordinator(ScriptedGenerator::new(nested_snapshot()));

    coordinator.propose_structure("book a flight").await.unwrap();
    coordinator.confirm_structure().unwrap();
    coordinator.run_generation().await.unwrap();

    assert_eq!(finalizer.calls(), 1);
    let tree = coordinator.tree().unwrap();
    assert_eq!(tree.len(), 5);
    for node in tree.flatten() {
        assert_eq!(node.constraints().unwrap().rules.len(), 1);
        assert!(node.parser().unwrap().variable.contains(&node.label.replace(' ', "_")));
        assert!(node.messages().unwrap().prompt.contains(&node.label));
    }
}

#[tokio::test(start_paused = true)]
async fn exhausted_phase_blocks_completion_until_manual_retry() {
    let (mut coordinator, generator, finalizer) = coordinator(
        ScriptedGenerator::new(flat_snapshot(&["one", "two", "three"]))
            .with_failures("two", Phase::Parser, 3),
    );

    coordinator.propose_structure("three fields").await.unwrap();
    coordinator.confirm_structure().unwrap();
    coordinator.run_generation().await.unwrap();

    // blocked: the batch finished but node two's parser is terminally failed
    assert_eq!(coordinator.mode(), WizardMode::Generating);
    assert_eq!(finalizer.calls(), 0);
    assert_eq!(generator.phase_calls("two", Phase::Parser), 3);

    let progress = coordinator.progress().unwrap();
    assert_eq!(progress.phases[Phase::Constraints.index()].percent, 100);
    assert_eq!(progress.phases[Phase::Messages.index()].percent, 100);
    assert_eq!(progress.phases[Phase::Parser.index()].completed, 2);
    assert_eq!(progress.phases[Phase::Parser.index()].total, 3);

    let two = node_id_by_label(&coordinator, "two");
    assert_eq!(
        coordinator.tree().unwrap().node(two).unwrap().phase_status(Phase::Parser),
        PhaseStatus::Failed
    );
    assert_eq!(
        coordinator.retry_state(two, Phase::Parser).status,
        RetryStatus::Failed
    );
    assert_eq!(
        coordinator.summary().unwrap().failed,
        vec![(two, Phase::Parser)]
    );

    // only the manual out-of-band retry can unblock the run
    coordinator.retry_node_phase(two, Phase::Parser).await.unwrap();

    assert_eq!(coordinator.mode(), WizardMode::Completed);
    assert_eq!(finalizer.calls(), 1);
    assert_eq!(generator.phase_calls("two", Phase::Parser), 4);
    assert_eq!(
        coordinator.retry_state(two, Phase::Parser).status,
        RetryStatus::Succeeded
    );
}

#[tokio::test(start_paused = true)]
async fn reentrant_generation_start_is_a_no_op() {
    let (mut coordinator, generator, finalizer) = coordinator(
        ScriptedGenerator::new(flat_snapshot(&["one", "two"]))
            .with_failures("one", Phase::Messages, 3),
    );

    coordinator.propose_structure("two fields").await.unwrap();
    coordinator.confirm_structure().unwrap();
    coordinator.run_generation().await.unwrap();
    assert_eq!(coordinator.mode(), WizardMode::Generating);

    let calls_after_first_run = generator.total_phase_calls();
    coordinator.run_generation().await.unwrap();

    assert_eq!(generator.total_phase_calls(), calls_after_first_run);
    assert_eq!(finalizer.calls(), 0);
    assert_eq!(coordinator.mode(), WizardMode::Generating);
}

#[tokio::test]
async fn failed_finalization_is_retried_on_rerun() {
    let (mut coordinator, _generator, finalizer) = coordinator_with_finalizer(
        ScriptedGenerator::new(flat_snapshot(&["name"])),
        CountingFinalizer::failing(1),
    );

    coordinator.propose_structure("collect a name").await.unwrap();
    coordinator.confirm_structure().unwrap();

    let err = coordinator.run_generation().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Finalize(_)));

    // batch is fully complete, only persistence failed
    assert_eq!(coordinator.mode(), WizardMode::Generating);
    assert_eq!(finalizer.calls(), 1);
    let tree = coordinator.tree().unwrap();
    assert!(tree.completion_gaps().is_empty());
    assert!(!tree.is_frozen());

    // re-running generation retries finalization instead of spawning work
    coordinator.run_generation().await.unwrap();

    assert_eq!(coordinator.mode(), WizardMode::Completed);
    assert_eq!(finalizer.calls(), 2);
    assert!(coordinator.tree().unwrap().is_frozen());

    // a completed session rejects further starts and never re-finalizes
    assert!(coordinator.run_generation().await.is_err());
    assert_eq!(finalizer.calls(), 2);
}

#[tokio::test]
async fn subscriber_sees_phase_events_and_one_all_complete() {
    let (mut coordinator, _generator, _finalizer) =
        coordinator(ScriptedGenerator::new(flat_snapshot(&["a", "b"])));
    let mut events = coordinator.subscribe();

    coordinator.propose_structure("two fields").await.unwrap();
    coordinator.confirm_structure().unwrap();
    coordinator.run_generation().await.unwrap();

    let mut phase_completes = 0;
    let mut all_completes = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            ProgressEvent::PhaseComplete { .. } => phase_completes += 1,
            ProgressEvent::AllComplete => all_completes += 1,
            ProgressEvent::Progress { completed, total, .. } => {
                assert!(completed <= total);
            }
        }
    }
    assert_eq!(phase_completes, 3);
    assert_eq!(all_completes, 1);
}
