//! Retry and timeout policies for loads.
//!
//! Policies here are pure data: a [`RetryPolicy`] describes *what* retry
//! behavior you want, and the [`Retry`](crate::Retry) decorator executes it.
//!
//! # Quick Start
//!
//! ```rust
//! use loadwell::{Load, LoadExt, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let policy = RetryPolicy::exponential(Duration::from_millis(100))
//!     .with_max_retries(3);
//!
//! let loader = (|| async { Ok::<_, String>(42) }).with_retry(policy);
//!
//! assert_eq!(loader.load().await.unwrap(), 42);
//! # });
//! ```
//!
//! # Retry Strategies
//!
//! - **Constant**: Fixed delay between retries
//! - **Linear**: Delay increases linearly (100ms, 200ms, 300ms, ...)
//! - **Exponential**: Delay grows by a multiplier (100ms, 200ms, 400ms, ...)
//!
//! # Jitter Support
//!
//! The base schedule is deterministic. Enable the `jitter` feature to spread
//! retries from many clients apart:
//!
//! ```toml
//! loadwell = { version = "...", features = ["jitter"] }
//! ```
//!
//! ```rust,ignore
//! use loadwell::RetryPolicy;
//! use std::time::Duration;
//!
//! // Add ±25% randomness to delays
//! let policy = RetryPolicy::exponential(Duration::from_millis(100))
//!     .with_jitter(0.25)
//!     .with_max_retries(5);
//! ```
//!
//! # Error Types
//!
//! - [`RetryExhausted`]: Returned when all retries fail, contains the final error and metadata
//! - [`TimeoutError`]: Returned when a load misses its deadline

mod error;
mod policy;

pub use error::{RetryExhausted, TimeoutError};
pub use policy::{
    JitterStrategy, RetryEvent, RetryPolicy, RetryStrategy, DEFAULT_BACKOFF_MULTIPLIER,
    DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES,
};

#[cfg(test)]
mod tests;
