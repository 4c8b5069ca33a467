//! Extension trait providing decorator methods for all loaders.
//!
//! The `LoadExt` trait is automatically implemented for all types
//! that implement `Load`. It provides ergonomic builder methods
//! like `with_retry`, `with_timeout`, and `boxed`.

use std::borrow::Cow;
use std::time::Duration;

use crate::loader::boxed::BoxedLoader;
use crate::loader::instrument::Instrumented;
use crate::loader::retry::{Retry, RetryTimeoutOptions, Timeout};
use crate::loader::tracked::Tracked;
use crate::loader::trait_def::Load;
use crate::retry::RetryPolicy;
use crate::sink::ErrorSink;

/// Extension trait providing decorator methods for all loaders.
///
/// This trait is automatically implemented for all types that implement `Load`.
/// You don't need to implement this trait yourself.
///
/// Decorators read inside out: the method called last wraps everything
/// before it.
///
/// # Example
///
/// ```rust
/// use loadwell::{Load, LoadExt, RetryPolicy, TracingSink};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let loader = (|| async { Ok::<_, String>("chart.js") })
///     .with_timeout(Duration::from_secs(5))     // each attempt
///     .with_retry(RetryPolicy::default())       // the attempt sequence
///     .with_error_tracking("chart.js", TracingSink); // the final outcome
///
/// assert_eq!(loader.load().await, Ok("chart.js"));
/// # });
/// ```
pub trait LoadExt: Load + Sized {
    /// Retry failed attempts according to `policy`.
    ///
    /// See [`with_retry`](crate::with_retry).
    fn with_retry(self, policy: RetryPolicy) -> Retry<Self> {
        Retry::new(self, policy)
    }

    /// Fail with a timeout error when an attempt outlives `duration`.
    ///
    /// See [`with_timeout`](crate::with_timeout).
    fn with_timeout(self, duration: Duration) -> Timeout<Self> {
        Timeout::new(self, duration)
    }

    /// Limit each attempt with a deadline, then retry.
    ///
    /// See [`with_retry_and_timeout`](crate::with_retry_and_timeout).
    fn with_retry_and_timeout(self, options: RetryTimeoutOptions) -> Retry<Timeout<Self>> {
        crate::loader::retry::with_retry_and_timeout(self, options)
    }

    /// Report failures to `sink` under `name`.
    ///
    /// See [`with_error_tracking`](crate::with_error_tracking).
    fn with_error_tracking<S>(self, name: impl Into<Cow<'static, str>>, sink: S) -> Tracked<Self, S>
    where
        S: ErrorSink<Self::Error>,
    {
        Tracked::with_sink(self, name, sink)
    }

    /// Run every attempt inside `span`.
    fn instrument(self, span: tracing::Span) -> Instrumented<Self> {
        Instrumented { inner: self, span }
    }

    /// Erase the loader's type.
    ///
    /// Needed to store loaders of different types in one collection, e.g.
    /// for [`load_all`](crate::load_all).
    fn boxed(self) -> BoxedLoader<Self::Output, Self::Error>
    where
        Self: 'static,
        Self::Output: 'static,
        Self::Error: 'static,
    {
        BoxedLoader::new(self)
    }
}

impl<L: Load> LoadExt for L {}
