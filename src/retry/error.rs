//! What a retried or time-limited load fails with.

use std::time::Duration;

/// A retried load ran out of attempts.
///
/// Keeps the last failure exactly as the loader produced it, together with
/// how many times the load was started and how long the whole sequence took.
///
/// # Examples
///
/// ```rust
/// use loadwell::{Load, LoadExt, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::constant(Duration::from_millis(1)).with_max_retries(2);
/// let loader = (|| async { Err::<(), _>("chunk unavailable") }).with_retry(policy);
///
/// let exhausted = loader.load().await.unwrap_err();
/// assert_eq!(exhausted.final_error, "chunk unavailable");
/// assert_eq!(exhausted.attempts, 3); // first load + 2 retries
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// What the last load attempt failed with.
    pub final_error: E,
    /// How many times the load was started.
    pub attempts: u32,
    /// Time from the first load attempt until giving up, backoff included.
    pub total_duration: Duration,
}

impl<E> RetryExhausted<E> {
    /// Wrap the last failure of a load that was started `attempts` times.
    pub fn new(final_error: E, attempts: u32, total_duration: Duration) -> Self {
        Self {
            final_error,
            attempts,
            total_duration,
        }
    }

    /// The loader's own error, without the attempt bookkeeping.
    pub fn into_error(self) -> E {
        self.final_error
    }

    /// Borrow the loader's own error.
    pub fn error(&self) -> &E {
        &self.final_error
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "load failed after {} attempts ({:?}): {}",
            self.attempts, self.total_duration, self.final_error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}

/// A load limited with a deadline either ran out of time or failed on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// Nothing settled before the deadline.
    Timeout {
        /// The deadline the load missed.
        duration: Duration,
    },
    /// The loader failed before the deadline.
    Inner(E),
}

impl<E> TimeoutError<E> {
    /// A load that missed a deadline of `duration`.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// A loader failure that arrived in time.
    pub fn inner(error: E) -> Self {
        Self::Inner(error)
    }

    /// True when the deadline fired first.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True when the loader failed in time.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// The loader's own error; `None` when the deadline fired.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { duration } => write!(f, "load timed out after {:?}", duration),
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Inner(e) => Some(e),
        }
    }
}
