//! Orchestrator configuration

use intake_retry::RetryPolicy;

/// Configuration for one coordinator
///
/// The retry constants (3 attempts, 1000 ms base, x2) live in
/// [`RetryPolicy::default`]; hosts may surface them however they like, this
/// core exposes no CLI or file format for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationConfig {
    /// Retry/backoff parameters applied to every (node, phase) call
    pub retry: RetryPolicy,
}

impl GenerationConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a different retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
