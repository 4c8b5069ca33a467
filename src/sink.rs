//! Observability sinks for failed loads.
//!
//! A sink records failures without influencing control flow: the
//! [`Tracked`](crate::Tracked) decorator reports each failure and then returns
//! the error unchanged.
//!
//! Sinks are injected explicitly rather than reached through globals:
//!
//! | Sink | Behavior |
//! |------|----------|
//! | [`NoopSink`] | Discards reports (the default) |
//! | [`TracingSink`] | Emits an `ERROR` event through `tracing` |
//! | `Fn(&str, &E)` | Any closure, e.g. forwarding to an analytics client |
//!
//! ```rust
//! use loadwell::ErrorSink;
//!
//! let sink = |name: &str, error: &String| eprintln!("{name}: {error}");
//! sink.report("chart.js", &"network error".to_string());
//! ```

use std::fmt;

/// A collaborator that observes load failures.
pub trait ErrorSink<E: ?Sized>: Send + Sync {
    /// Record that the load called `name` failed with `error`.
    fn report(&self, name: &str, error: &E);
}

impl<E, F> ErrorSink<E> for F
where
    E: ?Sized,
    F: Fn(&str, &E) + Send + Sync,
{
    fn report(&self, name: &str, error: &E) {
        self(name, error)
    }
}

/// A sink that ignores every report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopSink;

impl<E: ?Sized> ErrorSink<E> for NoopSink {
    fn report(&self, _name: &str, _error: &E) {}
}

/// A sink that logs every report as a `tracing` error event.
///
/// The event carries the load name in the `name` field and the error's
/// `Display` output in the `error` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracingSink;

impl<E: fmt::Display + ?Sized> ErrorSink<E> for TracingSink {
    fn report(&self, name: &str, error: &E) {
        tracing::error!(name, error = %error, "failed to load");
    }
}
