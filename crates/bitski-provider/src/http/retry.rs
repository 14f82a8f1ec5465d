/*
[INPUT]:  Retryable operation and the attempt number of each failure
[OUTPUT]: Delay before the next attempt, or the operation's final outcome
[POS]:    HTTP layer - bounded retry schedule for the transport
[UPDATE]: When changing the attempt ceiling or delay table
*/

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::http::{ProviderError, Result};

/// Total attempts per call, including the first
pub const MAX_ATTEMPTS: u32 = 5;

/// Delay before attempts 2..=5
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 4] = [250, 500, 1_000, 2_000];

/// Retry schedule: attempt ceiling plus an increasing delay table
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delays: Vec<Duration>,
    /// Add up to 10% random jitter to each delay
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(delays_ms: &[u64], jitter: bool) -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delays: delays_ms.iter().copied().map(Duration::from_millis).collect(),
            jitter,
        }
    }

    /// Same ceiling, no waiting
    pub fn immediate() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delays: Vec::new(),
            jitter: false,
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    ///
    /// Attempts past the end of the table reuse its last entry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1) as usize;
        let base = self
            .delays
            .get(index)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO);

        if !self.jitter {
            return base;
        }

        let jitter_range = base.as_millis() as u64 / 10;
        if jitter_range == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_range))
    }
}

impl RetryPolicy {
    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt ceiling is reached.
    ///
    /// `operation` receives the 1-based attempt number. Retryable failures
    /// sleep for [`Self::delay_for`] before the next attempt.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(method = %label, attempt, "attempt");

            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    if attempt >= max_attempts {
                        warn!(method = %label, attempts = attempt, error = %err, "retries exhausted");
                        return Err(ProviderError::RetryExhausted {
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        method = %label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&DEFAULT_RETRY_DELAYS_MS, true)
    }
}
