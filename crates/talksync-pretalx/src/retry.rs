//! Exponential-backoff retry for Pretalx API calls.
//!
//! The import is a batch job, so backoff sleeps are plain awaits and the
//! schedule is deterministic (no jitter): `1s, 2s, 4s, …` capped at 60s.

use std::future::Future;
use std::time::Duration;

use crate::error::PretalxError;

const MAX_DELAY_SECS: u64 = 60;

/// Returns `true` if `err` is a transient condition worth another attempt.
///
/// Retriable:
/// - [`PretalxError::Http`] — network-level failure (timeout, reset).
/// - [`PretalxError::UnexpectedStatus`] with 429 or 5xx.
/// - [`PretalxError::Deserialize`] — the API intermittently serves truncated
///   payloads; a fresh request usually parses.
///
/// Not retriable:
/// - [`PretalxError::UnexpectedStatus`] with other 4xx (bad token, bad slug).
/// - [`PretalxError::InvalidBaseUrl`] — config problem.
/// - [`PretalxError::PaginationLimit`] — loop guard, not transient.
fn is_retriable(err: &PretalxError) -> bool {
    match err {
        PretalxError::Http(_) | PretalxError::Deserialize { .. } => true,
        PretalxError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        PretalxError::InvalidBaseUrl { .. } | PretalxError::PaginationLimit { .. } => false,
    }
}

/// Runs `operation` up to `max_attempts` times total, sleeping
/// `backoff_base_secs * 2^(attempt-1)` seconds (capped at 60) between
/// attempts on retriable errors.
///
/// With `max_attempts = 3` and `backoff_base_secs = 1` the schedule is:
/// try, sleep 1s, try, sleep 2s, try, give up. Non-retriable errors are
/// returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, PretalxError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PretalxError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let delay_secs = backoff_base_secs
                    .saturating_mul(1u64 << (attempt - 1).min(62))
                    .min(MAX_DELAY_SECS);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs,
                    error = %err,
                    "transient Pretalx error — retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> PretalxError {
        PretalxError::UnexpectedStatus {
            status: 502,
            url: "https://pretalx.test/api".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, PretalxError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_after_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PretalxError>(server_error())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "max_attempts is a total");
        assert!(matches!(
            result,
            Err(PretalxError::UnexpectedStatus { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn retries_deserialize_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 1 {
                    let e = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
                    Err(PretalxError::Deserialize {
                        context: "test".to_owned(),
                        source: e,
                    })
                } else {
                    Ok::<u32, PretalxError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PretalxError>(PretalxError::UnexpectedStatus {
                    status: 403,
                    url: "https://pretalx.test/api".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "4xx must not be retried");
        assert!(matches!(
            result,
            Err(PretalxError::UnexpectedStatus { status: 403, .. })
        ));
    }

    #[test]
    fn backoff_delays_double_and_cap() {
        // Mirror the delay computation for attempts 1..=8 with base 1s.
        let delays: Vec<u64> = (1u32..=8)
            .map(|attempt| {
                1u64.saturating_mul(1u64 << (attempt - 1).min(62))
                    .min(MAX_DELAY_SECS)
            })
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }
}
