use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{default_should_retry, BackoffStrategy, Classify};

/// Default upper bound on operation invocations.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base unit for the backoff schedule.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Predicate deciding whether a failure is worth another attempt.
pub type ShouldRetry<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Observer called with `(attempt_number, error)` before each retry wait.
pub type OnRetry<E> = Arc<dyn Fn(u32, &E) + Send + Sync>;

/// Configuration for one retried operation.
///
/// Cloning is cheap: the predicate and observer are shared.
pub struct RetryOptions<E> {
    max_attempts: u32,
    base_delay: Duration,
    backoff: BackoffStrategy,
    should_retry: ShouldRetry<E>,
    on_retry: Option<OnRetry<E>>,
}

impl<E> RetryOptions<E> {
    /// Creates options with default limits and a caller-supplied predicate.
    ///
    /// Use this for error types that do not implement [`Classify`].
    pub fn with_predicate<F>(should_retry: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff: BackoffStrategy::default(),
            should_retry: Arc::new(should_retry),
            on_retry: None,
        }
    }

    /// Set the maximum number of invocations (clamped to at least 1).
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base delay of the backoff schedule.
    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the backoff strategy.
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the retry predicate.
    #[must_use]
    pub fn should_retry<F>(mut self, should_retry: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(should_retry);
        self
    }

    /// Install an observer invoked once per retry, before waiting.
    #[must_use]
    pub fn on_retry<F>(mut self, on_retry: F) -> Self
    where
        F: Fn(u32, &E) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(on_retry));
        self
    }

    /// Upper bound on invocations of the operation.
    pub fn attempt_limit(&self) -> u32 {
        self.max_attempts
    }

    /// Base unit of the backoff schedule.
    pub fn delay_unit(&self) -> Duration {
        self.base_delay
    }

    pub fn strategy(&self) -> BackoffStrategy {
        self.backoff
    }

    /// Evaluates the retry predicate for `error`.
    pub fn is_retryable(&self, error: &E) -> bool {
        (self.should_retry)(error)
    }

    /// Notifies the observer, if any, that attempt `attempt_number` failed
    /// and will be retried.
    pub fn notify_retry(&self, attempt_number: u32, error: &E) {
        if let Some(on_retry) = &self.on_retry {
            on_retry(attempt_number, error);
        }
    }

    /// Delay to wait after failed attempt `attempt_index` (zero-based).
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.backoff.delay(self.base_delay, attempt_index)
    }
}

impl<E: Classify + 'static> Default for RetryOptions<E> {
    fn default() -> Self {
        Self::with_predicate(|error: &E| default_should_retry(error))
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            backoff: self.backoff,
            should_retry: Arc::clone(&self.should_retry),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("backoff", &self.backoff)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}
