use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Shape of the delay schedule between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// `base × attempt_index`: 0s, 1s, 2s, ...
    Linear,
    /// `base × 2^attempt_index`: 1s, 2s, 4s, ...
    #[default]
    Exponential,
}

impl BackoffStrategy {
    /// Returns the wait before the retry that follows failed attempt
    /// `attempt_index` (zero-based).
    ///
    /// Saturates at [`Duration::MAX`] instead of overflowing.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use storecache_core::retry::BackoffStrategy;
    ///
    /// let base = Duration::from_millis(1000);
    /// assert_eq!(BackoffStrategy::Exponential.delay(base, 0), Duration::from_millis(1000));
    /// assert_eq!(BackoffStrategy::Exponential.delay(base, 2), Duration::from_millis(4000));
    /// assert_eq!(BackoffStrategy::Linear.delay(base, 0), Duration::ZERO);
    /// assert_eq!(BackoffStrategy::Linear.delay(base, 2), Duration::from_millis(2000));
    /// ```
    pub fn delay(self, base: Duration, attempt_index: u32) -> Duration {
        match self {
            BackoffStrategy::Linear => base.saturating_mul(attempt_index),
            BackoffStrategy::Exponential => {
                let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
        }
    }

    /// Total time spent waiting across `failed_attempts` consecutive
    /// retries.
    pub fn total_delay(self, base: Duration, failed_attempts: u32) -> Duration {
        (0..failed_attempts).fold(Duration::ZERO, |total, index| {
            total.saturating_add(self.delay(base, index))
        })
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffStrategy::Linear => write!(f, "linear"),
            BackoffStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown backoff strategy: {0}")]
pub struct ParseBackoffError(pub String);

impl FromStr for BackoffStrategy {
    type Err = ParseBackoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(BackoffStrategy::Linear),
            "exponential" => Ok(BackoffStrategy::Exponential),
            other => Err(ParseBackoffError(other.to_string())),
        }
    }
}
