//! Bounded retry for store writes that must not be lost.

use montage_core::config::PersistenceConfig;
use std::time::Duration;
use tracing::warn;

use crate::error::StoreResult;

/// Retry schedule: up to `attempts` tries, waiting `backoff x attempt`
/// between them. Client errors are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    pub fn from_config(config: &PersistenceConfig) -> Self {
        Self::new(config.snapshot_retry_attempts, config.snapshot_retry_backoff())
    }

    /// Single attempt.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// attempts run out. Blocks the calling thread during backoff.
    pub fn run<T>(&self, mut op: impl FnMut() -> StoreResult<T>) -> StoreResult<T> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts && err.is_retryable() => {
                    warn!(attempt, attempts, error = %err, "Store write failed, retrying");
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff * attempt);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PersistenceConfig::default())
    }
}
