use std::future::Future;
use std::time::Duration;

use storecache_core::retry::{RetryOptions, RetryOutcome};

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent.
///
/// Between attempts the executor notifies the `on_retry` observer and then
/// sleeps for the backoff delay. No delay follows the final attempt.
/// Failures are reported through the returned [`RetryOutcome`]; this
/// function never panics on the caller's behalf.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use storecache::retry::with_retry;
/// use storecache_core::retry::{FailureKind, RetryOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let options = RetryOptions::<FailureKind>::default().base_delay(Duration::ZERO);
///
/// let outcome = with_retry(|| async { Err::<u32, _>(FailureKind::from_status(404)) }, &options).await;
///
/// // 404 is not retryable: a single attempt is made.
/// assert!(!outcome.succeeded());
/// assert_eq!(outcome.attempts_made, 1);
/// # }
/// ```
pub async fn with_retry<F, Fut, T, E>(mut operation: F, options: &RetryOptions<E>) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = options.attempt_limit();
    let mut attempt_index: u32 = 0;

    loop {
        let attempt_number = attempt_index + 1;

        let error = match operation().await {
            Ok(value) => {
                if attempt_index > 0 {
                    tracing::debug!(attempts = attempt_number, "Operation succeeded after retrying");
                }
                return RetryOutcome::success(value, attempt_number);
            }
            Err(error) => error,
        };

        if !options.is_retryable(&error) {
            tracing::debug!(attempt = attempt_number, "Operation failed with a non-retryable error");
            return RetryOutcome::failure(error, attempt_number);
        }

        if attempt_number >= max_attempts {
            tracing::debug!(attempts = attempt_number, "Retry attempts exhausted");
            return RetryOutcome::failure(error, attempt_number);
        }

        options.notify_retry(attempt_number, &error);

        let delay = options.delay_for(attempt_index);
        tracing::warn!(
            attempt = attempt_number,
            max_attempts,
            delay_ms = saturating_millis(delay),
            "Operation failed, retrying"
        );
        tokio::time::sleep(delay).await;

        attempt_index += 1;
    }
}

/// Whole milliseconds in `duration`, clamped to `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use storecache_core::retry::{BackoffStrategy, FailureKind};
    use storecache_core::store::BackendError;
    use tokio::time::Instant;

    /// Operation that fails `failures` times with `error`, then returns `value`.
    fn flaky<E: Clone>(
        calls: &Arc<AtomicU32>,
        failures: u32,
        error: E,
        value: &'static str,
    ) -> impl FnMut() -> std::future::Ready<Result<&'static str, E>> {
        let calls = Arc::clone(calls);
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            if call < failures {
                std::future::ready(Err(error.clone()))
            } else {
                std::future::ready(Ok(value))
            }
        }
    }

    fn always_retry() -> RetryOptions<String> {
        RetryOptions::with_predicate(|_: &String| true)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let retries = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&retries);
        let options = always_retry().on_retry(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = with_retry(flaky(&calls, 0, "x".to_string(), "ok"), &options).await;

        assert_eq!(outcome, RetryOutcome::success("ok", 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(retries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_once_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer = Arc::clone(&seen);
        let options = always_retry().on_retry(move |attempt, error: &String| {
            observer.lock().unwrap().push((attempt, error.clone()));
        });

        let outcome = with_retry(flaky(&calls, 1, "boom".to_string(), "ok"), &options).await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.value(), Some(&"ok"));
        assert_eq!(outcome.attempts_made, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.lock().unwrap(), vec![(1, "boom".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer = Arc::clone(&seen);
        let options = always_retry().on_retry(move |attempt, _| {
            observer.lock().unwrap().push(attempt);
        });

        let outcome = with_retry(flaky(&calls, 2, "boom".to_string(), "ok"), &options).await;

        assert_eq!(outcome, RetryOutcome::success("ok", 3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_wait_only_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let retries = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&retries);
        let options = always_retry().on_retry(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let started = Instant::now();
        let outcome = with_retry(flaky(&calls, u32::MAX, "down".to_string(), "never"), &options).await;
        let waited = started.elapsed();

        assert_eq!(outcome, RetryOutcome::failure("down".to_string(), 3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2);
        // 1000ms after the first failure + 2000ms after the second.
        assert_eq!(waited, Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_backoff_waits() {
        let calls = Arc::new(AtomicU32::new(0));
        let options = always_retry()
            .max_attempts(4)
            .base_delay(Duration::from_millis(100))
            .backoff(BackoffStrategy::Linear);

        let started = Instant::now();
        let outcome = with_retry(flaky(&calls, u32::MAX, "down".to_string(), "never"), &options).await;

        assert_eq!(outcome.attempts_made, 4);
        // 0 + 100 + 200
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let retries = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&retries);
        let options = RetryOptions::<BackendError>::default()
            .max_attempts(5)
            .on_retry(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let started = Instant::now();
        let outcome = with_retry(
            flaky(&calls, u32::MAX, BackendError::status(404, "missing"), "never"),
            &options,
        )
        .await;

        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(outcome.last_error(), Some(&BackendError::status(404, "missing")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(retries.load(Ordering::SeqCst), 0);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_classifier_retries_server_faults() {
        let calls = Arc::new(AtomicU32::new(0));
        let options = RetryOptions::<BackendError>::default();

        let outcome = with_retry(
            flaky(&calls, 2, BackendError::status(503, "busy"), "ok"),
            &options,
        )
        .await;

        assert_eq!(outcome, RetryOutcome::success("ok", 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_then_non_retryable() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let operation = move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            let status = if call == 0 { 429 } else { 400 };
            std::future::ready(Err::<(), _>(FailureKind::from_status(status)))
        };

        let outcome = with_retry(operation, &RetryOptions::default()).await;

        assert_eq!(outcome.attempts_made, 2);
        assert_eq!(
            outcome.last_error(),
            Some(&FailureKind::ClientRejected { status: 400 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let options = always_retry().max_attempts(1);

        let outcome = with_retry(flaky(&calls, 1, "boom".to_string(), "ok"), &options).await;

        assert_eq!(outcome, RetryOutcome::failure("boom".to_string(), 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_composed_predicate() {
        use storecache_core::retry::default_should_retry;

        let calls = Arc::new(AtomicU32::new(0));
        let options = RetryOptions::with_predicate(|err: &BackendError| {
            default_should_retry(err) || matches!(err, BackendError::NotFound { .. })
        })
        .base_delay(Duration::from_millis(10));

        let outcome = with_retry(
            flaky(&calls, 1, BackendError::not_found("orders", "o-1"), "found"),
            &options,
        )
        .await;

        assert_eq!(outcome, RetryOutcome::success("found", 2));
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::from_micros(999)), 0);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }
}
