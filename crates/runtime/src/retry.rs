//! The two retry policies of the orchestration layer.
//!
//! Single-model turns favour resilience: several attempts with exponential
//! backoff. Multi-model branches favour latency: one retry after a fixed
//! delay. Both retry only errors whose kind is retryable.

use qcore::Result;
use serde::{Deserialize, Serialize};
use std::{future::Future, time::Duration};

/// Policy for single-model turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleModelRetry {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff seed; the n-th retry waits `base_delay_ms * 2^n`.
    pub base_delay_ms: u64,
    /// Upper bound for a single backoff.
    pub max_delay_ms: u64,
}

impl Default for SingleModelRetry {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

impl SingleModelRetry {
    /// Backoff before the given retry (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or
    /// the attempts run out. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay(attempt);
                    tracing::warn!(attempt, ?delay, kind = ?e.kind(), "retrying single-model call: {e}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Policy for each branch of a multi-model fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiModelRetry {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Fixed wait before each retry.
    pub delay_ms: u64,
}

impl Default for MultiModelRetry {
    fn default() -> Self {
        Self {
            retries: 1,
            delay_ms: 1000,
        }
    }
}

impl MultiModelRetry {
    /// Run `call`, retrying retryable failures after a fixed delay.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt <= self.retries => {
                    tracing::warn!(attempt, kind = ?e.kind(), "retrying fan-out branch: {e}");
                    tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
