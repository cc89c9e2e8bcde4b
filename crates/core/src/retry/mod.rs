mod backoff;
mod kind;
mod options;
mod outcome;

pub use backoff::{BackoffStrategy, ParseBackoffError};
pub use kind::{default_should_retry, Classify, FailureKind};
pub use options::{
    OnRetry, RetryOptions, ShouldRetry, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS,
};
pub use outcome::RetryOutcome;
