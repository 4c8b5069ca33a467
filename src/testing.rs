//! Testing utilities and helpers for loadwell
//!
//! This module provides ergonomic utilities for testing code that builds on
//! loaders. It includes scripted loaders, a recording sink, and assertion
//! macros. Pair them with tokio's paused clock
//! (`#[tokio::test(start_paused = true)]`) to check timing without waiting.
//!
//! # Examples
//!
//! ## Scripted loaders
//!
//! ```rust
//! use loadwell::testing::FlakyLoader;
//! use loadwell::{Load, LoadExt, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! // Fails twice, then succeeds.
//! let flaky = FlakyLoader::new(2, "offline", "module");
//! let loader = flaky.clone().with_retry(RetryPolicy::constant(Duration::from_millis(1)));
//!
//! assert_eq!(loader.load().await, Ok("module"));
//! assert_eq!(flaky.calls(), 3);
//! # });
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use loadwell::{assert_exhausted, assert_timed_out, Load, LoadExt, RetryPolicy};
//! use loadwell::testing::never_settles;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let slow = never_settles::<(), String>().with_timeout(Duration::from_millis(1));
//! assert_timed_out!(slow.load().await);
//!
//! let failing = (|| async { Err::<(), _>("down") }).with_retry(
//!     RetryPolicy::constant(Duration::from_millis(1)).with_max_retries(1),
//! );
//! assert_exhausted!(failing.load().await, 2);
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::loader::Load;
use crate::sink::ErrorSink;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A sink that keeps every report for later inspection.
///
/// Clones share the same record, so keep one clone and hand the other to the
/// decorator under test.
///
/// ```rust
/// use loadwell::testing::RecordingSink;
/// use loadwell::ErrorSink;
///
/// let sink = RecordingSink::new();
/// sink.report("chart.js", &"timeout".to_string());
///
/// assert_eq!(sink.reports(), vec![("chart.js".to_string(), "timeout".to_string())]);
/// ```
pub struct RecordingSink<E> {
    reports: Arc<Mutex<Vec<(String, E)>>>,
}

impl<E> RecordingSink<E> {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of reports received.
    pub fn len(&self) -> usize {
        lock(&self.reports).len()
    }

    /// Returns true when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the loads reported, in order.
    pub fn names(&self) -> Vec<String> {
        lock(&self.reports)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl<E: Clone> RecordingSink<E> {
    /// Every `(name, error)` pair received, in order.
    pub fn reports(&self) -> Vec<(String, E)> {
        lock(&self.reports).clone()
    }
}

impl<E> Default for RecordingSink<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RecordingSink<E> {
    fn clone(&self) -> Self {
        Self {
            reports: Arc::clone(&self.reports),
        }
    }
}

impl<E> fmt::Debug for RecordingSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSink")
            .field("reports", &self.len())
            .finish()
    }
}

impl<E: Clone + Send> ErrorSink<E> for RecordingSink<E> {
    fn report(&self, name: &str, error: &E) {
        lock(&self.reports).push((name.to_string(), error.clone()));
    }
}

struct FlakyState<T, E> {
    failures: u32,
    error: E,
    value: T,
    calls: AtomicU32,
    started: Mutex<Vec<Instant>>,
}

/// A loader that fails a fixed number of times before succeeding.
///
/// Every call is counted and its start time recorded on the tokio clock, so
/// tests can check how many attempts were made and when. Clones share the
/// script and the call record.
pub struct FlakyLoader<T, E> {
    state: Arc<FlakyState<T, E>>,
    latency: Option<Duration>,
}

impl<T, E> FlakyLoader<T, E> {
    /// Fail the first `failures` calls with `error`, then return `value`.
    pub fn new(failures: u32, error: E, value: T) -> Self {
        Self {
            state: Arc::new(FlakyState {
                failures,
                error,
                value,
                calls: AtomicU32::new(0),
                started: Mutex::new(Vec::new()),
            }),
            latency: None,
        }
    }

    /// Make every call through this handle take `latency` before settling.
    ///
    /// Only this handle and clones made from it afterwards are slowed down;
    /// clones made earlier keep their own setting but still share the call
    /// record.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Tokio-clock instants at which each call started.
    pub fn call_times(&self) -> Vec<Instant> {
        lock(&self.state.started).clone()
    }

    /// Offsets of every call from the first one.
    pub fn call_offsets(&self) -> Vec<Duration> {
        let times = self.call_times();
        match times.first() {
            Some(&first) => times.iter().map(|t| t.duration_since(first)).collect(),
            None => Vec::new(),
        }
    }
}

impl<T, E: Clone> FlakyLoader<T, E> {
    /// A loader whose every call fails with `error`.
    pub fn always_failing(error: E) -> Self
    where
        T: Default,
    {
        Self::new(u32::MAX, error, T::default())
    }
}

impl<T, E> Clone for FlakyLoader<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            latency: self.latency,
        }
    }
}

impl<T, E> fmt::Debug for FlakyLoader<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlakyLoader")
            .field("failures", &self.state.failures)
            .field("calls", &self.calls())
            .field("latency", &self.latency)
            .finish()
    }
}

impl<T, E> Load for FlakyLoader<T, E>
where
    T: Clone + Send + Sync,
    E: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;

    fn load(&self) -> impl Future<Output = Result<T, E>> + Send {
        let n = self.state.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.state.started).push(Instant::now());

        let outcome = if n < self.state.failures {
            Err(self.state.error.clone())
        } else {
            Ok(self.state.value.clone())
        };
        let latency = self.latency;

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
    }
}

/// A loader whose every call stays pending forever.
pub fn never_settles<T: Send, E: Send>() -> impl Load<Output = T, Error = E> {
    || futures::future::pending::<Result<T, E>>()
}

/// Assert that a load result is a timeout.
///
/// Accepts a `Result<_, TimeoutError<_>>` and panics on anything else.
#[macro_export]
macro_rules! assert_timed_out {
    ($result:expr) => {
        match $result {
            Err($crate::TimeoutError::Timeout { .. }) => {}
            other => panic!("Expected a timeout, got {:?}", other),
        }
    };
}

/// Assert that a retried load gave up after an exact number of attempts.
///
/// Accepts a `Result<_, RetryExhausted<_>>`.
#[macro_export]
macro_rules! assert_exhausted {
    ($result:expr, $attempts:expr) => {
        match $result {
            Err(exhausted) => assert_eq!(
                exhausted.attempts, $attempts,
                "unexpected attempt count, final error: {:?}",
                exhausted.final_error
            ),
            Ok(v) => panic!("Expected exhausted retries, got Ok({:?})", v),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_loader_fails_then_succeeds() {
        let loader = FlakyLoader::new(1, "err", 5);

        assert_eq!(loader.load().await, Err("err"));
        assert_eq!(loader.load().await, Ok(5));
        assert_eq!(loader.load().await, Ok(5));
        assert_eq!(loader.calls(), 3);
    }

    #[tokio::test]
    async fn test_always_failing() {
        let loader = FlakyLoader::<(), _>::always_failing("nope");

        for _ in 0..3 {
            assert_eq!(loader.load().await, Err("nope"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_settlement() {
        let loader = FlakyLoader::new(0, "err", 1).with_latency(Duration::from_millis(30));
        let start = Instant::now();

        assert_eq!(loader.load().await, Ok(1));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_after_clone_applies_to_this_handle() {
        let fast = FlakyLoader::new(1, "err", 1);
        let slow = fast.clone().with_latency(Duration::from_millis(30));

        let start = Instant::now();
        assert_eq!(slow.load().await, Err("err"));
        assert!(start.elapsed() >= Duration::from_millis(30));

        let start = Instant::now();
        assert_eq!(fast.load().await, Ok(1));
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert_eq!(fast.calls(), 2);
        assert_eq!(slow.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_offsets_follow_the_clock() {
        let loader = FlakyLoader::new(0, "err", ());

        let _ = loader.load().await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        let _ = loader.load().await;

        let offsets = loader.call_offsets();
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets[0], Duration::ZERO);
        assert!(offsets[1] >= Duration::from_millis(25));
    }

    #[test]
    fn test_recording_sink_shares_reports_between_clones() {
        let sink = RecordingSink::new();
        let handle = sink.clone();

        sink.report("a", &1);
        sink.report("b", &2);

        assert_eq!(handle.len(), 2);
        assert_eq!(handle.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            handle.reports(),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_recording_sink_starts_empty() {
        let sink: RecordingSink<String> = RecordingSink::default();
        assert!(sink.is_empty());
    }

    #[test]
    #[should_panic(expected = "Expected a timeout")]
    fn test_assert_timed_out_rejects_success() {
        let result: Result<i32, crate::TimeoutError<String>> = Ok(1);
        assert_timed_out!(result);
    }

    #[test]
    #[should_panic(expected = "unexpected attempt count")]
    fn test_assert_exhausted_checks_count() {
        let result: Result<(), crate::RetryExhausted<&str>> =
            Err(crate::RetryExhausted::new("e", 2, Duration::ZERO));
        assert_exhausted!(result, 3);
    }
}
