//! Retry and timeout decorators.
//!
//! These decorators execute the pure policies in [`crate::retry`]:
//!
//! - [`Retry`] re-runs a failing load with backoff between attempts
//! - [`Timeout`] races a load against a deadline
//! - [`with_retry_and_timeout`] limits every attempt with a deadline, then
//!   retries the sequence

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::loader::trait_def::Load;
use crate::retry::{
    RetryEvent, RetryExhausted, RetryPolicy, TimeoutError, DEFAULT_BACKOFF_MULTIPLIER,
    DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES,
};

/// Deadline used by [`RetryTimeoutOptions::default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type RetryHook<E> = Arc<dyn Fn(&RetryEvent<'_, E>) + Send + Sync>;

/// A load that is retried according to a [`RetryPolicy`].
///
/// Attempts run strictly one after another: attempt N+1 never starts before
/// attempt N has settled. Between attempts the decorator sleeps on the tokio
/// timer, so waiting never blocks the thread.
///
/// Each failed attempt that will be retried emits a `WARN` event carrying the
/// number of attempts remaining; giving up emits an `ERROR` event.
///
/// Created by [`with_retry`] or [`LoadExt::with_retry`](crate::LoadExt::with_retry).
pub struct Retry<L: Load> {
    inner: L,
    policy: RetryPolicy,
    should_retry: Option<RetryPredicate<L::Error>>,
    on_retry: Option<RetryHook<L::Error>>,
}

impl<L: Load> Retry<L> {
    /// Wrap `inner` with `policy`.
    pub fn new(inner: L, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            should_retry: None,
            on_retry: None,
        }
    }

    /// Retry only when the predicate returns true for the error.
    ///
    /// Non-retryable errors end the sequence immediately. Useful for telling
    /// transient failures (network) from permanent ones (module not found).
    ///
    /// ```rust
    /// use loadwell::{Load, LoadExt, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// #[derive(Debug, PartialEq)]
    /// enum FetchError { Offline, NotFound }
    ///
    /// # tokio_test::block_on(async {
    /// let loader = (|| async { Err::<(), _>(FetchError::NotFound) })
    ///     .with_retry(RetryPolicy::constant(Duration::from_millis(10)))
    ///     .retry_if(|err| matches!(err, FetchError::Offline));
    ///
    /// let exhausted = loader.load().await.unwrap_err();
    /// assert_eq!(exhausted.attempts, 1);
    /// assert_eq!(exhausted.final_error, FetchError::NotFound);
    /// # });
    /// ```
    pub fn retry_if<P>(mut self, should_retry: P) -> Self
    where
        P: Fn(&L::Error) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(should_retry));
        self
    }

    /// Observe every failed attempt.
    ///
    /// The hook runs synchronously before the backoff delay; keep it cheap
    /// and use it for metrics or custom logging.
    pub fn on_retry<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, L::Error>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// The policy driving this decorator.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The wrapped loader.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }
}

impl<L: Load> Load for Retry<L> {
    type Output = L::Output;
    type Error = RetryExhausted<L::Error>;

    fn load(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        async move {
            let start = Instant::now();
            let mut attempt = 0u32;
            let mut prev_delay: Option<Duration> = None;

            loop {
                let error = match self.inner.load().await {
                    Ok(value) => {
                        if attempt > 0 {
                            tracing::debug!(attempts = attempt + 1, "load succeeded after retry");
                        }
                        return Ok(value);
                    }
                    Err(error) => error,
                };

                let retryable = self.should_retry.as_ref().is_none_or(|p| p(&error));
                let delay = if retryable {
                    self.policy.delay_with_jitter(attempt, prev_delay)
                } else {
                    None
                };

                if let Some(hook) = &self.on_retry {
                    let event = RetryEvent {
                        attempt: attempt + 1,
                        error: &error,
                        next_delay: delay,
                        elapsed: start.elapsed(),
                    };
                    hook(&event);
                }

                match delay {
                    Some(d) => {
                        tracing::warn!(
                            attempt = attempt + 1,
                            remaining = self.policy.max_retries() - attempt,
                            delay_ms = d.as_millis() as u64,
                            "load failed, retrying"
                        );
                        tokio::time::sleep(d).await;
                        prev_delay = Some(d);
                        attempt += 1;
                    }
                    None => {
                        if retryable {
                            tracing::error!(attempts = attempt + 1, "load failed after retries");
                        } else {
                            tracing::debug!(
                                attempts = attempt + 1,
                                "load failed with a non-retryable error"
                            );
                        }
                        return Err(RetryExhausted::new(error, attempt + 1, start.elapsed()));
                    }
                }
            }
        }
    }
}

impl<L: Load + Clone> Clone for Retry<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            policy: self.policy.clone(),
            should_retry: self.should_retry.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<L: Load + fmt::Debug> fmt::Debug for Retry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .field("retry_if", &self.should_retry.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// A load that fails with [`TimeoutError::Timeout`] when it does not settle
/// within a deadline.
///
/// The load and a tokio timer race; whichever finishes first decides the
/// outcome. When the timer wins, the pending attempt is dropped and its
/// eventual result is never observed. No cancellation signal is passed to
/// the loader, so work it handed off elsewhere (a spawned task, a request
/// already on the wire) keeps running.
///
/// Created by [`with_timeout`] or [`LoadExt::with_timeout`](crate::LoadExt::with_timeout).
#[derive(Debug, Clone)]
pub struct Timeout<L> {
    inner: L,
    duration: Duration,
}

impl<L> Timeout<L> {
    /// Limit `inner` to `duration` per call.
    ///
    /// The load is polled before the timer is checked, so with a zero
    /// `duration` a load that is ready on its first poll still succeeds and
    /// anything that has to wait fails with [`TimeoutError::Timeout`].
    pub fn new(inner: L, duration: Duration) -> Self {
        Self { inner, duration }
    }

    /// The deadline applied to each call.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The wrapped loader.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }
}

impl<L: Load> Load for Timeout<L> {
    type Output = L::Output;
    type Error = TimeoutError<L::Error>;

    fn load(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        async move {
            match tokio::time::timeout(self.duration, self.inner.load()).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(TimeoutError::Inner(e)),
                Err(_) => {
                    tracing::debug!(
                        timeout_ms = self.duration.as_millis() as u64,
                        "load timed out"
                    );
                    Err(TimeoutError::Timeout {
                        duration: self.duration,
                    })
                }
            }
        }
    }
}

/// Settings for [`with_retry_and_timeout`].
///
/// ```rust
/// use loadwell::RetryTimeoutOptions;
/// use std::time::Duration;
///
/// let options = RetryTimeoutOptions {
///     max_retries: 2,
///     timeout: Duration::from_secs(5),
///     ..Default::default()
/// };
///
/// assert_eq!(options.initial_delay, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryTimeoutOptions {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Deadline for each individual attempt.
    pub timeout: Duration,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Growth factor between consecutive delays. Values below `1.0`, and
    /// NaN, are treated as `1.0`.
    pub backoff_multiplier: f64,
}

impl Default for RetryTimeoutOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryTimeoutOptions {
    /// The exponential retry policy these options describe.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.initial_delay)
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_max_retries(self.max_retries)
    }

    /// Upper bound on the time a load wrapped with these options may take.
    ///
    /// Every attempt times out and every backoff delay elapses in the worst
    /// case: `(max_retries + 1) * timeout + Σ delays`.
    pub fn worst_case_latency(&self) -> Duration {
        self.policy().worst_case_latency(self.timeout)
    }
}

/// Retry a load according to `policy`.
///
/// On success the first successful value is returned; when every attempt
/// fails, [`RetryExhausted`] carries the error from the **last** attempt.
///
/// ```rust
/// use loadwell::{with_retry, Load, RetryPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let calls = &AtomicU32::new(0);
/// let flaky = move || async move {
///     if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///         Err("network error")
///     } else {
///         Ok("module")
///     }
/// };
///
/// let loader = with_retry(flaky, RetryPolicy::constant(Duration::from_millis(1)));
/// assert_eq!(loader.load().await, Ok("module"));
/// # });
/// ```
pub fn with_retry<L: Load>(loader: L, policy: RetryPolicy) -> Retry<L> {
    Retry::new(loader, policy)
}

/// Limit every call of a load to `duration`.
///
/// See [`Timeout::new`] for how a zero `duration` behaves.
pub fn with_timeout<L: Load>(loader: L, duration: Duration) -> Timeout<L> {
    Timeout::new(loader, duration)
}

/// Limit each attempt with a deadline, then retry the sequence.
///
/// A timed out attempt counts as a failure like any other error, so the
/// final error is a [`TimeoutError`] wrapped in [`RetryExhausted`].
///
/// ```rust
/// use loadwell::{with_retry_and_timeout, Load, RetryTimeoutOptions};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let loader = with_retry_and_timeout(
///     || async { Ok::<_, String>("chart.js") },
///     RetryTimeoutOptions {
///         max_retries: 3,
///         timeout: Duration::from_secs(5),
///         initial_delay: Duration::from_secs(1),
///         ..Default::default()
///     },
/// );
///
/// assert_eq!(loader.load().await, Ok("chart.js"));
/// # });
/// ```
pub fn with_retry_and_timeout<L: Load>(
    loader: L,
    options: RetryTimeoutOptions,
) -> Retry<Timeout<L>> {
    Retry::new(Timeout::new(loader, options.timeout), options.policy())
}
