//! The core `Load` trait.

use std::future::Future;

/// A deferred unit of asynchronous work producing a value or an error.
///
/// A loader is borrowed for every attempt, so it can be invoked any number of
/// times: retrying means "call `load` again from scratch". Loaders are never
/// mutated or cached by the decorators in this crate.
///
/// Any `Fn() -> impl Future<Output = Result<T, E>>` closure is a loader:
///
/// ```rust
/// use loadwell::Load;
///
/// # tokio_test::block_on(async {
/// let fetch_chart = || async { Ok::<_, String>("chart module") };
///
/// assert_eq!(fetch_chart.load().await, Ok("chart module"));
/// # });
/// ```
///
/// The returned future is `Send`, so loads can be spawned with
/// [`preload`](crate::preload) or polled from any runtime worker.
pub trait Load: Send + Sync {
    /// The value produced on success.
    type Output: Send;
    /// The error produced on failure.
    type Error: Send;

    /// Start one attempt of the load.
    fn load(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

impl<F, Fut, T, E> Load for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    fn load(&self) -> impl Future<Output = Result<T, E>> + Send {
        self()
    }
}
