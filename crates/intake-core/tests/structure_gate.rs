//! Functional tests for the structure phase and its gates.
//!
//! Core guarantees exercised here:
//! - Confirmation is a point of no return: structure re-generation is
//!   rejected with no side effect, and the installed tree is untouched.
//! - Duplicate node ids in an incoming structure abort immediately, before
//!   any phase work is scheduled.
//! - The correction loop (propose -> reject -> resubmit) works and the
//!   resubmitted structure replaces the proposal.
//! - Manual retry is rejected outside `Generating` or for phases that are
//!   not terminally failed.

use intake_core::{
    Finalizer, GenerationConfig, GenerationCoordinator, Generator, OrchestratorError,
};
use intake_test_utils::{
    duplicate_id_snapshot, flat_snapshot, CountingFinalizer, ScriptedGenerator,
};
use intake_tree::{Phase, TreeError};
use intake_wizard::{WizardError, WizardMode};
use std::sync::Arc;

fn coordinator(
    generator: ScriptedGenerator,
) -> (
    GenerationCoordinator,
    Arc<ScriptedGenerator>,
    Arc<CountingFinalizer>,
) {
    let generator = Arc::new(generator);
    let finalizer = Arc::new(CountingFinalizer::new());
    let coordinator = GenerationCoordinator::new(
        GenerationConfig::new(),
        Arc::clone(&generator) as Arc<dyn Generator>,
        Arc::clone(&finalizer) as Arc<dyn Finalizer>,
    );
    (coordinator, generator, finalizer)
}

#[tokio::test]
async fn structure_is_locked_after_confirmation() {
    let (mut coordinator, generator, _finalizer) =
        coordinator(ScriptedGenerator::new(flat_snapshot(&["name"])));

    coordinator.propose_structure("collect a name").await.unwrap();
    coordinator.confirm_structure().unwrap();
    let root = coordinator.tree().unwrap().roots()[0];

    let err = coordinator.propose_structure("try again").await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Wizard(WizardError::PointOfNoReturn {
            mode: WizardMode::StructureConfirmed
        })
    ));

    // rejected before the collaborator was called; tree untouched
    assert_eq!(generator.structure_calls(), 1);
    assert_eq!(coordinator.tree().unwrap().roots()[0], root);
    assert_eq!(coordinator.mode(), WizardMode::StructureConfirmed);
}

#[tokio::test]
async fn structure_is_locked_after_completion() {
    let (mut coordinator, generator, _finalizer) =
        coordinator(ScriptedGenerator::new(flat_snapshot(&["name"])));

    coordinator.propose_structure("collect a name").await.unwrap();
    coordinator.confirm_structure().unwrap();
    coordinator.run_generation().await.unwrap();
    assert_eq!(coordinator.mode(), WizardMode::Completed);
    let root = coordinator.tree().unwrap().roots()[0];

    let err = coordinator.propose_structure("start over").await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Wizard(WizardError::PointOfNoReturn {
            mode: WizardMode::Completed
        })
    ));
    assert_eq!(generator.structure_calls(), 1);
    assert_eq!(coordinator.tree().unwrap().roots()[0], root);
}

#[tokio::test]
async fn duplicate_ids_abort_before_any_phase_work() {
    let (mut coordinator, generator, finalizer) =
        coordinator(ScriptedGenerator::new(duplicate_id_snapshot()));

    let err = coordinator.propose_structure("broken").await.unwrap_err();
    match err {
        OrchestratorError::Tree(TreeError::DuplicateIds(ids)) => assert_eq!(ids.len(), 1),
        other => panic!("expected DuplicateIds, got {other}"),
    }

    assert_eq!(coordinator.mode(), WizardMode::Start);
    assert!(coordinator.tree().is_none());
    assert_eq!(generator.total_phase_calls(), 0);
    assert_eq!(finalizer.calls(), 0);
}

#[tokio::test]
async fn empty_structure_is_rejected() {
    let (mut coordinator, _generator, _finalizer) =
        coordinator(ScriptedGenerator::new(flat_snapshot(&[])));

    let err = coordinator.propose_structure("nothing").await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Tree(TreeError::EmptyStructure)
    ));
    assert_eq!(coordinator.mode(), WizardMode::Start);
}

#[tokio::test]
async fn correction_loop_replaces_the_proposal() {
    let (mut coordinator, generator, _finalizer) = coordinator(ScriptedGenerator::with_snapshots(
        vec![flat_snapshot(&["name"]), flat_snapshot(&["first", "last"])],
    ));

    coordinator.propose_structure("collect a name").await.unwrap();
    assert_eq!(coordinator.tree().unwrap().len(), 1);

    coordinator.request_correction().unwrap();
    assert_eq!(coordinator.mode(), WizardMode::StructureCorrection);

    coordinator
        .propose_structure("split into first and last")
        .await
        .unwrap();
    assert_eq!(coordinator.mode(), WizardMode::StructureProposed);
    assert_eq!(generator.structure_calls(), 2);

    let labels: Vec<&str> = coordinator
        .tree()
        .unwrap()
        .flatten()
        .iter()
        .map(|n| n.label.as_str())
        .collect();
    assert_eq!(labels, vec!["first", "last"]);

    coordinator.confirm_structure().unwrap();
    assert_eq!(coordinator.mode(), WizardMode::StructureConfirmed);
}

#[tokio::test]
async fn confirm_requires_a_proposal() {
    let (mut coordinator, _generator, _finalizer) =
        coordinator(ScriptedGenerator::new(flat_snapshot(&["name"])));
    assert!(matches!(
        coordinator.confirm_structure(),
        Err(OrchestratorError::NoTree)
    ));
}

#[tokio::test]
async fn manual_retry_is_fenced() {
    let (mut coordinator, _generator, _finalizer) =
        coordinator(ScriptedGenerator::new(flat_snapshot(&["name"])));

    coordinator.propose_structure("collect a name").await.unwrap();
    let node = coordinator.tree().unwrap().roots()[0];

    // not generating yet
    assert!(matches!(
        coordinator.retry_node_phase(node, Phase::Parser).await,
        Err(OrchestratorError::Wizard(WizardError::InvalidTransition { .. }))
    ));

    coordinator.confirm_structure().unwrap();
    coordinator.run_generation().await.unwrap();

    // completed runs have nothing to retry either
    assert_eq!(coordinator.mode(), WizardMode::Completed);
    assert!(coordinator.retry_node_phase(node, Phase::Parser).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn manual_retry_rejects_non_failed_phases() {
    let (mut coordinator, _generator, _finalizer) = coordinator(
        ScriptedGenerator::new(flat_snapshot(&["one", "two"]))
            .with_failures("two", Phase::Parser, 3),
    );

    coordinator.propose_structure("two fields").await.unwrap();
    coordinator.confirm_structure().unwrap();
    coordinator.run_generation().await.unwrap();
    assert_eq!(coordinator.mode(), WizardMode::Generating);

    let one = coordinator.tree().unwrap().roots()[0];
    assert!(matches!(
        coordinator.retry_node_phase(one, Phase::Parser).await,
        Err(OrchestratorError::PhaseNotFailed { .. })
    ));
}
