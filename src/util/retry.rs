//! Fixed-delay retry.

use std::future::Future;
use std::time::Duration;

use crate::error::HostError;

/// Retry policy for gateway calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `operation` until it succeeds or attempts run out; the last error
    /// is returned. Every error is retried.
    pub async fn execute<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, HostError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HostError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(label, attempts = attempt, error = %e, "giving up");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts,
                        transient = e.is_transient(),
                        error = %e,
                        "Retrying after error"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
