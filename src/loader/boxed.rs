//! Type-erased loaders.
//!
//! Every decorator has its own concrete type, so loaders built from different
//! closures cannot share a `Vec`. [`BoxedLoader`] erases the type at the cost
//! of one allocation per call:
//!
//! ```rust
//! use loadwell::{load_all, BoxedLoader, LoadExt};
//!
//! # tokio_test::block_on(async {
//! let loaders: Vec<BoxedLoader<&str, String>> = vec![
//!     (|| async { Ok("react-ga4") }).boxed(),
//!     (|| async { Ok("mixpanel") }).boxed(),
//! ];
//!
//! assert_eq!(load_all(loaders).await, Ok(vec!["react-ga4", "mixpanel"]));
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::loader::trait_def::Load;

type LoadFn<T, E> = dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync;

/// A loader with its concrete type erased.
///
/// Cloning is cheap: clones share the underlying loader.
pub struct BoxedLoader<T, E> {
    inner: Arc<LoadFn<T, E>>,
}

impl<T, E> BoxedLoader<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Erase the type of `loader`.
    pub fn new<L>(loader: L) -> Self
    where
        L: Load<Output = T, Error = E> + 'static,
    {
        let loader = Arc::new(loader);
        Self {
            inner: Arc::new(move || {
                let loader = Arc::clone(&loader);
                async move { loader.load().await }.boxed()
            }),
        }
    }
}

impl<T, E> Load for BoxedLoader<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn load(&self) -> impl Future<Output = Result<T, E>> + Send {
        (self.inner)()
    }
}

impl<T, E> Clone for BoxedLoader<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for BoxedLoader<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedLoader").finish_non_exhaustive()
    }
}
