//! Bounded waits for external calls
//!
//! Every network call in the pipeline is wrapped so that a hung provider
//! turns into [`ArtistError::Timeout`] instead of stalling the run.
//!
//! ```ignore
//! let response = with_timeout(
//!     Duration::from_secs(120),
//!     provider.complete(&prompt),
//!     "architecture analysis",
//! )
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{ArtistError, Result};

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ArtistError::timeout(operation_name, timeout)),
    }
}

/// Like [`with_timeout`] for futures that carry their own error type.
///
/// The elapsed case is reported through `on_timeout` so callers can keep
/// their stage-local error (e.g. a tier's `GenerationError`).
pub async fn with_timeout_or<T, E, F>(
    timeout: Duration,
    future: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> std::result::Result<T, E>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, ArtistError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ArtistError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), ArtistError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_with_timeout_or_maps_elapsed() {
        let result: std::result::Result<u8, String> = with_timeout_or(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(1)
            },
            |d| format!("timed out after {}ms", d.as_millis()),
        )
        .await;
        assert_eq!(result.unwrap_err(), "timed out after 10ms");
    }
}
