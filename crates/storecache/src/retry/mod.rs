//! Retry-with-backoff for fallible async operations.

mod executor;
mod wrap;

pub use executor::with_retry;
pub(crate) use executor::saturating_millis;
pub use wrap::{wrap_with_retry, wrap_with_retry_args};

pub use storecache_core::retry::{
    default_should_retry, BackoffStrategy, Classify, FailureKind, RetryOptions, RetryOutcome,
};
