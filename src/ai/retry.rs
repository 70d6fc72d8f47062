//! Bounded retry with exponential backoff
//!
//! Attempt `n` (1-based) that fails with a retryable error waits
//! `base * 2^(n-1)` before the next attempt. After the final attempt the wait
//! is only kept for `Backoff::RetryWaitingAfterLast` failures, so three rate
//! limits at a 1s base wait 1s, 2s and 4s while three transport errors wait
//! 1s and 2s. Non-retryable errors return at once.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Sleeps between attempts; swapped for a recorder in tests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Real wall-clock sleeping on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// How the retry loop treats one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Return the error at once
    Stop,
    /// Try again; no wait once the attempts are used up
    Retry,
    /// Try again, and wait out the delay even after the final attempt
    RetryWaitingAfterLast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Exactly one attempt, no waiting
    pub fn single() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the failed attempt with 0-based index `attempt_index`
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(1000))
    }
}

/// Run `op` (given the 1-based attempt number) until it succeeds, `backoff`
/// says stop, or the policy is exhausted. `on_failure` sees every failed
/// attempt before any waiting.
pub async fn retry_with_backoff<T, E, Op, Fut, B, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: Op,
    backoff: B,
    mut on_failure: F,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Fn(&E) -> Backoff,
    F: FnMut(u32, &E),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                on_failure(attempt, &error);

                let decision = backoff(&error);
                if decision == Backoff::Stop {
                    return Err(error);
                }

                let last = attempt >= max_attempts;
                if !last || decision == Backoff::RetryWaitingAfterLast {
                    let delay = policy.delay_for(attempt - 1);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "[Retry] Backing off"
                    );
                    sleeper.sleep(delay).await;
                }

                if last {
                    return Err(error);
                }
                attempt += 1;
            }
        }
    }
}

/// Records requested delays without waiting
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct RecordingSleeper {
    delays: std::sync::Arc<std::sync::Mutex<Vec<Duration>>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn delays_ms(&self) -> Vec<u128> {
        self.delays
            .lock()
            .map(|d| d.iter().map(|x| x.as_millis()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }
}
