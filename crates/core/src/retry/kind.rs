//! Pure classification of operation failures.
//!
//! Raw errors are mapped to a [`FailureKind`] once, where they enter the
//! system (see [`Classify`]). Retry decisions then match on the kind and
//! never probe error fields directly.

use std::fmt;

/// Closed set of failure categories relevant to retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request timed out (HTTP 408 or a timeout-named error).
    Timeout,
    /// The backend asked us to slow down (HTTP 429).
    RateLimited,
    /// The backend failed on its side (HTTP 5xx).
    ServerFault { status: u16 },
    /// The backend rejected the request itself (HTTP 4xx other than 408/429).
    ClientRejected { status: u16 },
    /// The network was unreachable or the connection dropped.
    NetworkUnavailable,
    /// Nothing recognizable.
    Unknown,
}

impl FailureKind {
    /// Maps an HTTP-style status code to a failure kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use storecache_core::retry::FailureKind;
    ///
    /// assert_eq!(FailureKind::from_status(404), FailureKind::ClientRejected { status: 404 });
    /// assert_eq!(FailureKind::from_status(429), FailureKind::RateLimited);
    /// assert_eq!(FailureKind::from_status(503), FailureKind::ServerFault { status: 503 });
    /// assert_eq!(FailureKind::from_status(302), FailureKind::Unknown);
    /// ```
    pub fn from_status(status: u16) -> Self {
        match status {
            408 => FailureKind::Timeout,
            429 => FailureKind::RateLimited,
            400..=499 => FailureKind::ClientRejected { status },
            500.. => FailureKind::ServerFault { status },
            _ => FailureKind::Unknown,
        }
    }

    /// Maps an error name (e.g. `"NetworkError"`, `"TimeoutError"`) to a
    /// failure kind. Matching is case-insensitive.
    pub fn from_error_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("timeout") || name.contains("timedout") {
            FailureKind::Timeout
        } else if name.contains("network") || name.contains("offline") {
            FailureKind::NetworkUnavailable
        } else {
            FailureKind::Unknown
        }
    }

    /// Returns true if a failure of this kind is worth retrying.
    pub fn is_retryable(self) -> bool {
        match self {
            FailureKind::Timeout
            | FailureKind::RateLimited
            | FailureKind::ServerFault { .. }
            | FailureKind::NetworkUnavailable => true,
            FailureKind::ClientRejected { .. } | FailureKind::Unknown => false,
        }
    }

    /// Returns the status code carried by this kind, if any.
    pub fn status(self) -> Option<u16> {
        match self {
            FailureKind::Timeout => Some(408),
            FailureKind::RateLimited => Some(429),
            FailureKind::ServerFault { status } | FailureKind::ClientRejected { status } => {
                Some(status)
            }
            FailureKind::NetworkUnavailable | FailureKind::Unknown => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::ServerFault { status } => write!(f, "server fault ({status})"),
            FailureKind::ClientRejected { status } => write!(f, "client rejected ({status})"),
            FailureKind::NetworkUnavailable => write!(f, "network unavailable"),
            FailureKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Boundary mapping from a concrete error type to a [`FailureKind`].
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for FailureKind {
    fn failure_kind(&self) -> FailureKind {
        *self
    }
}

impl Classify for std::io::Error {
    fn failure_kind(&self) -> FailureKind {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::TimedOut => FailureKind::Timeout,
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::AddrNotAvailable => FailureKind::NetworkUnavailable,
            _ => FailureKind::Unknown,
        }
    }
}

/// Built-in retry predicate.
///
/// Retries timeouts, rate limiting, server faults and network outages;
/// everything else (client rejections, unrecognized errors) fails fast.
///
/// Exposed on its own so callers can compose it:
///
/// ```
/// use storecache_core::retry::{default_should_retry, FailureKind};
///
/// let retry_missing = true;
/// let should_retry = |err: &FailureKind| {
///     default_should_retry(err) || (retry_missing && err.status() == Some(404))
/// };
///
/// assert!(should_retry(&FailureKind::from_status(404)));
/// assert!(!should_retry(&FailureKind::from_status(403)));
/// ```
pub fn default_should_retry<E: Classify + ?Sized>(error: &E) -> bool {
    error.failure_kind().is_retryable()
}
