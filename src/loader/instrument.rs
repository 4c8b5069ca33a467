//! Tracing support for loads.
//!
//! This module provides the `Instrumented` decorator for wrapping every
//! attempt of a load in a tracing span.

use std::future::Future;

use tracing::Instrument as _;

use crate::loader::trait_def::Load;

/// A load whose attempts run inside a tracing span.
///
/// Created by [`LoadExt::instrument`](crate::LoadExt::instrument). The span is
/// entered each time the load is polled and exited when it yields, following
/// the standard `tracing::Instrument` pattern for async code. Events emitted
/// by inner decorators (retry warnings, timeouts) are attributed to the span.
///
/// ```rust
/// use loadwell::{Load, LoadExt, RetryPolicy};
/// use tracing::info_span;
///
/// # tokio_test::block_on(async {
/// let loader = (|| async { Ok::<_, String>("dashboard") })
///     .with_retry(RetryPolicy::default())
///     .instrument(info_span!("load_module", module = "dashboard"));
///
/// assert_eq!(loader.load().await, Ok("dashboard"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Instrumented<L> {
    pub(crate) inner: L,
    pub(crate) span: tracing::Span,
}

impl<L: Load> Load for Instrumented<L> {
    type Output = L::Output;
    type Error = L::Error;

    fn load(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        self.inner.load().instrument(self.span.clone())
    }
}

#[cfg(test)]
mod tests {
    // Glob-importing the parent would also bring `tracing::Instrument` into
    // scope and make `.instrument()` ambiguous.
    use crate::loader::ext::LoadExt;
    use crate::loader::trait_def::Load;
    use crate::retry::RetryPolicy;
    use std::time::Duration;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn test_instrument_returns_value() {
        let loader = (|| async { Ok::<_, String>(42) }).instrument(tracing::info_span!("test_span"));

        assert_eq!(loader.load().await, Ok(42));
    }

    #[tokio::test]
    async fn test_error_in_span_propagates() {
        let loader =
            (|| async { Err::<i32, _>("oops".to_string()) }).instrument(tracing::info_span!("failing"));

        assert_eq!(loader.load().await, Err("oops".to_string()));
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_retry_events_carry_span() {
        let loader = (|| async { Err::<(), _>("offline") })
            .with_retry(RetryPolicy::constant(Duration::from_millis(5)).with_max_retries(1))
            .instrument(tracing::info_span!("load_module", module = "reports"));

        let _ = loader.load().await;

        assert!(logs_contain("load_module"));
        assert!(logs_contain("load failed, retrying"));
    }
}
