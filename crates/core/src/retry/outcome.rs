/// Result of running an operation under a retry policy.
///
/// A retried call never panics or re-raises on its own: failures are
/// reported here and the caller decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T, E> {
    /// The successful value, or the error of the last attempt made.
    pub result: Result<T, E>,
    /// Number of times the operation was invoked (always at least 1).
    pub attempts_made: u32,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn success(value: T, attempts_made: u32) -> Self {
        Self {
            result: Ok(value),
            attempts_made,
        }
    }

    pub fn failure(error: E, attempts_made: u32) -> Self {
        Self {
            result: Err(error),
            attempts_made,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn last_error(&self) -> Option<&E> {
        self.result.as_ref().err()
    }

    /// Drops the attempt count and returns the plain result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}
