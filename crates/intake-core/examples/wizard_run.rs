//! End-to-end wizard session against a scripted generator.
//!
//! Run with `RUST_LOG=info cargo run --example wizard_run` to watch the
//! structure gate, the parallel fan-out and the finalization in the logs.

use intake_core::{GenerationConfig, GenerationCoordinator};
use intake_test_utils::{nested_snapshot, CountingFinalizer, ScriptedGenerator};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let generator = Arc::new(ScriptedGenerator::new(nested_snapshot()));
    let finalizer = Arc::new(CountingFinalizer::new());
    let mut coordinator =
        GenerationCoordinator::new(GenerationConfig::new(), generator, finalizer);
    let mut events = coordinator.subscribe();

    let tree = coordinator.propose_structure("book a table").await?;
    println!("proposed structure ({} nodes):", tree.len());
    for node in tree.flatten() {
        println!("  {} ({:?})", node.label, node.kind);
    }

    coordinator.confirm_structure()?;
    coordinator.run_generation().await?;

    while let Ok(event) = events.try_recv() {
        println!("event: {}", serde_json::to_string(&event)?);
    }

    println!("final mode: {:?}", coordinator.mode());
    if let Some(progress) = coordinator.progress() {
        println!("overall progress: {}%", progress.overall);
    }
    Ok(())
}
