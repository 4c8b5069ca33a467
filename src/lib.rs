//! # Loadwell
//!
//! > *"Load it well, or fail it loudly"*
//!
//! Resilient async loading: retry with backoff, per-attempt deadlines,
//! failure reporting, and preload helpers for deferred operations such as
//! lazily loaded modules or remote resources.
//!
//! ## Philosophy
//!
//! A loader is a **repeatable** async operation. Resilience is added by
//! wrapping it in decorators, each one a plain struct implementing the same
//! [`Load`] trait:
//! - **Timeout** bounds a single attempt
//! - **Retry** re-runs failed attempts on a backoff schedule
//! - **Tracked** reports the final failure to an [`ErrorSink`]
//!
//! ## Quick Example
//!
//! ```rust
//! use loadwell::{Load, LoadExt, RetryPolicy, TracingSink};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let calls = &AtomicU32::new(0);
//!
//! // Fails on the first call only.
//! let fetch_chart = move || async move {
//!     if calls.fetch_add(1, Ordering::SeqCst) == 0 {
//!         Err("network unreachable".to_string())
//!     } else {
//!         Ok("chart.js")
//!     }
//! };
//!
//! let loader = fetch_chart
//!     .with_timeout(Duration::from_secs(5))
//!     .with_retry(RetryPolicy::exponential(Duration::from_millis(10)).with_max_retries(3))
//!     .with_error_tracking("chart.js", TracingSink);
//!
//! assert_eq!(loader.load().await.unwrap(), "chart.js");
//! assert_eq!(calls.load(Ordering::SeqCst), 2);
//! # });
//! ```
//!
//! ## Feature Flags
//!
//! - `jitter` - randomized retry delays via `rand`
//! - `serde` - (de)serialize [`LoaderConfig`]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod loader;
pub mod retry;
pub mod sink;
pub mod testing;

// Re-exports
pub use config::{ConfigError, LoaderConfig};
pub use loader::{
    load_all, load_all_settled, load_if, load_unless, preload, with_error_tracking, with_retry,
    with_retry_and_timeout, with_timeout, BoxedLoader, Instrumented, Load, LoadExt, LoadState,
    Preload, PreloadError, Retry, RetryTimeoutOptions, Timeout, Tracked, DEFAULT_TIMEOUT,
};
pub use retry::{
    JitterStrategy, RetryEvent, RetryExhausted, RetryPolicy, RetryStrategy, TimeoutError,
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES,
};
pub use sink::{ErrorSink, NoopSink, TracingSink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigError, LoaderConfig};
    pub use crate::loader::{
        load_all, load_all_settled, load_if, load_unless, preload, with_error_tracking,
        with_retry, with_retry_and_timeout, with_timeout, Load, LoadExt, RetryTimeoutOptions,
    };
    pub use crate::retry::{RetryExhausted, RetryPolicy, TimeoutError};
    pub use crate::sink::{ErrorSink, NoopSink, TracingSink};
}
