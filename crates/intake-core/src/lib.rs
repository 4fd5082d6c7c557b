//! Intake Core - generation orchestrator
//!
//! The state machine that drives task-tree generation:
//! - Gates the sequential structure phase behind user confirmation
//! - Fans out constraints/parser/messages generation across every node
//! - Retries failed work with exponential backoff
//! - Aggregates per-node progress into phase and global percentages
//! - Detects global completion exactly once and triggers finalization
//!
//! # Example
//!
//! ```rust,ignore
//! use intake_core::{GenerationConfig, GenerationCoordinator};
//!
//! # async fn example(generator: std::sync::Arc<dyn intake_core::Generator>,
//! #                  finalizer: std::sync::Arc<dyn intake_core::Finalizer>)
//! # -> Result<(), intake_core::OrchestratorError> {
//! let mut coordinator =
//!     GenerationCoordinator::new(GenerationConfig::new(), generator, finalizer);
//!
//! coordinator.propose_structure("book a flight").await?;
//! coordinator.confirm_structure()?;
//! coordinator.run_generation().await?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod error;
pub mod generator;

// Re-exports for convenience
pub use config::GenerationConfig;
pub use coordinator::GenerationCoordinator;
pub use detector::CompletionDetector;
pub use error::{GeneratorError, OrchestratorError};
pub use generator::{Finalizer, Generator, PersistedTree};
