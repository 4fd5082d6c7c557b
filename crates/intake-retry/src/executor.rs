//! Retry executor
//!
//! Runs one operation for one (node, phase) key with bounded attempts and
//! exponential backoff. The operation owns its own progress reporting; a
//! fresh attempt simply reports whatever the operation reports.

use crate::policy::RetryPolicy;
use dashmap::DashMap;
use intake_tree::{NodeId, Phase};
use std::future::Future;
use tokio::time::sleep;

/// Key identifying one unit of retryable work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryKey {
    /// Owning node
    pub node: NodeId,
    /// Generation phase
    pub phase: Phase,
}

impl RetryKey {
    /// Build a key
    #[inline]
    #[must_use]
    pub fn new(node: NodeId, phase: Phase) -> Self {
        Self { node, phase }
    }
}

impl std::fmt::Display for RetryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.node, self.phase)
    }
}

/// Lifecycle of one retry key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryStatus {
    /// No attempt recorded yet
    #[default]
    Idle,
    /// An attempt failed and a later attempt is pending or running
    Retrying,
    /// Some attempt succeeded
    Succeeded,
    /// All attempts exhausted
    Failed,
}

/// Per-key retry bookkeeping, created lazily on first use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Attempt counter (1-based once work has started)
    pub attempt: u32,
    /// Current status
    pub status: RetryStatus,
}

/// Executes operations under a [`RetryPolicy`], keeping per-key state
#[derive(Debug, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    states: DashMap<RetryKey, RetryState>,
}

impl RetryExecutor {
    /// Executor with the given policy
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            states: DashMap::new(),
        }
    }

    /// The active policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Current state for a key (`Idle` if the key has never run)
    #[must_use]
    pub fn state(&self, key: RetryKey) -> RetryState {
        self.states.get(&key).map_or_else(RetryState::default, |s| *s)
    }

    /// Drop recorded state for a key, restoring the full attempt budget
    ///
    /// Used by manual out-of-band retries of a terminally failed key.
    pub fn reset(&self, key: RetryKey) {
        self.states.remove(&key);
    }

    fn record(&self, key: RetryKey, attempt: u32, status: RetryStatus) {
        self.states.insert(key, RetryState { attempt, status });
    }

    /// Run `op` for `key`, retrying per the policy
    ///
    /// The closure receives the 1-based attempt number. On success the result
    /// is returned and the key is marked `Succeeded`; once attempts are
    /// exhausted the last error is returned and the key is marked `Failed`.
    /// The caller is responsible for turning that error into node-phase state
    /// and must not abort sibling work over it.
    pub async fn execute<T, E, F, Fut>(&self, key: RetryKey, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt: u32 = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    self.record(key, attempt, RetryStatus::Succeeded);
                    return Ok(value);
                }
                Err(err) if attempt >= self.policy.max_attempts => {
                    tracing::warn!(key = %key, attempt, error = %err, "retries exhausted");
                    self.record(key, attempt, RetryStatus::Failed);
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.policy.delay_before(attempt + 1);
                    tracing::debug!(
                        key = %key,
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, backing off"
                    );
                    attempt += 1;
                    self.record(key, attempt, RetryStatus::Retrying);
                    sleep(delay).await;
                }
            }
        }
    }
}
