//! Retry policy: which failures get another attempt and how long to wait.
//!
//! Backoff is linear (`n * base_delay` before retry `n`), not exponential.

use crate::error::AcquireError;
use backoff::backoff::Backoff;
use backoff::future::retry_notify;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Linear schedule that stops after `max_retries` waits.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_delay: Duration,
    max_retries: u32,
    retries: u32,
}

impl LinearBackoff {
    pub fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self { base_delay, max_retries, retries: 0 }
    }
}

impl Backoff for LinearBackoff {
    fn reset(&mut self) {
        self.retries = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        Some(self.base_delay.saturating_mul(self.retries))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    pub fn backoff(&self) -> LinearBackoff {
        LinearBackoff::new(self.base_delay, self.max_retries)
    }

    /// Run `attempt` until it succeeds, fails terminally, or the retry
    /// budget is spent. At most `max_retries + 1` attempts are made and the
    /// last error seen is returned.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, AcquireError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AcquireError>>,
    {
        let mut retries = 0u32;
        let max_retries = self.max_retries;

        retry_notify(
            self.backoff(),
            || {
                let fut = attempt();
                async move {
                    fut.await.map_err(|e| {
                        if e.is_retryable() {
                            backoff::Error::transient(e)
                        } else {
                            backoff::Error::permanent(e)
                        }
                    })
                }
            },
            |err: AcquireError, wait: Duration| {
                retries += 1;
                warn!(
                    operation,
                    retry = retries,
                    max_retries,
                    wait_ms = wait.as_millis() as u64,
                    "transient failure, retrying: {}",
                    err
                );
            },
        )
        .await
    }
}
