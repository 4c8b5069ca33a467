//! Loaders and the decorators that make them resilient.
//!
//! A loader is anything implementing [`Load`]: a deferred, repeatable async
//! operation such as a module fetch or an HTTP request. Decorators wrap one
//! loader in another, so resilience policies compose by nesting:
//!
//! ```text
//! Tracked( Retry( Timeout( your loader ) ) )
//!    │       │       └── bounds each attempt
//!    │       └────────── re-runs failed attempts with backoff
//!    └────────────────── reports the final failure to a sink
//! ```
//!
//! # Zero-Cost by Default
//!
//! Each decorator is a plain struct generic over the loader it wraps, so a
//! fully decorated loader is one concrete type with no heap allocation:
//!
//! ```rust
//! use loadwell::{Load, LoadExt, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! // Type: Tracked<Retry<Timeout<{closure}>>, NoopSink>
//! let loader = (|| async { Ok::<_, String>("pdf.js") })
//!     .with_timeout(Duration::from_secs(5))
//!     .with_retry(RetryPolicy::default())
//!     .with_error_tracking("pdf.js", loadwell::NoopSink);
//!
//! assert_eq!(loader.load().await, Ok("pdf.js"));
//! # });
//! ```
//!
//! # When to Use Boxing
//!
//! Use [`BoxedLoader`] (via [`LoadExt::boxed`]) when loaders of different
//! types must share a collection, typically for [`load_all`].
//!
//! # Cancellation
//!
//! No cancellation signal reaches a loader. A timed out attempt is dropped
//! and its result ignored; a failed batch drops its other in-flight loads.

pub mod boxed;
pub mod ext;
pub mod instrument;
pub mod parallel;
pub mod preload;
pub mod retry;
pub mod tracked;
mod trait_def;

// Re-export core trait
pub use trait_def::Load;

// Re-export extension trait
pub use ext::LoadExt;

pub use boxed::BoxedLoader;
pub use instrument::Instrumented;
pub use parallel::{load_all, load_all_settled};
pub use preload::{load_if, load_unless, preload, Preload, PreloadError};
pub use retry::{
    with_retry, with_retry_and_timeout, with_timeout, Retry, RetryTimeoutOptions, Timeout,
    DEFAULT_TIMEOUT,
};
pub use tracked::{with_error_tracking, LoadState, Tracked};
