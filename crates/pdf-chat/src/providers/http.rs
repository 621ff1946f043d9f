//! Shared HTTP plumbing for the remote providers: client construction and retry

use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Build a pooled client with a request timeout
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Client errors other than 429 will not fix themselves on retry
pub(crate) fn is_rejection(status: StatusCode) -> bool {
    status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS
}

/// Retry a request with exponential backoff (1s, 2s, 4s, ...)
///
/// Only retryable errors are retried; anything else is returned immediately.
pub(crate) async fn retry_request<F, Fut, T>(what: &str, max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    what,
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_retryable_errors_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = retry_request("embed", 2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::embedding("busy"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_request("generate", 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::llm("down")) }
        })
        .await;

        assert!(matches!(result, Err(Error::Llm(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rejection_statuses() {
        assert!(is_rejection(StatusCode::NOT_FOUND));
        assert!(is_rejection(StatusCode::UNAUTHORIZED));
        assert!(!is_rejection(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_rejection(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_non_retryable_errors_fail_fast() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_request("generate", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::InvalidInput("empty".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
