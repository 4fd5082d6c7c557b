//! Intake Retry - bounded retry with exponential backoff
//!
//! Wraps one generation call for one (node, phase) pair:
//! - Up to `max_attempts` attempts (3 by default)
//! - Exponential backoff between attempts (1000 ms base, x2)
//! - Per-key retry state, created lazily, never shared across keys
//! - The last error is propagated to the caller on exhaustion; the caller
//!   decides what a failed key means for the rest of the batch

// Core modules
pub mod executor;
pub mod policy;

// Re-exports for convenience
pub use executor::{RetryExecutor, RetryKey, RetryState, RetryStatus};
pub use policy::RetryPolicy;
