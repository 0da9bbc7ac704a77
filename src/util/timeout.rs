//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::HostError;

/// Bound `future` by `duration`; elapsing maps to [`HostError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, HostError>>,
) -> Result<T, HostError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(HostError::Timeout(duration.as_millis() as u64)),
    }
}
