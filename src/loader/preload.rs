//! Eager and conditional loading helpers.
//!
//! - [`preload`] starts a load right away, before anyone needs the result
//! - [`load_if`] loads only when a flag is set
//! - [`load_unless`] loads a fallback only when a capability check fails

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::loader::trait_def::Load;

/// Error from awaiting a [`Preload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadError<E> {
    /// The load itself failed.
    Load(E),
    /// The runtime shut down before the load finished.
    Cancelled,
}

impl<E> PreloadError<E> {
    /// Get the load error if present.
    pub fn into_load_error(self) -> Option<E> {
        match self {
            Self::Load(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for PreloadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "{}", e),
            Self::Cancelled => write!(f, "preload cancelled before completion"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for PreloadError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

/// Handle to a load started by [`preload`].
///
/// Awaiting the handle yields the load's result. Dropping it, or calling
/// [`detach`](Preload::detach), lets the load finish in the background with
/// its result discarded.
#[must_use = "await the preload or call `detach` to discard its result"]
pub struct Preload<T, E> {
    handle: JoinHandle<Result<T, E>>,
}

impl<T, E> Preload<T, E> {
    /// Let the load run to completion without observing its result.
    pub fn detach(self) {
        drop(self.handle);
    }

    /// Returns true once the load has settled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T, E> Future for Preload<T, E> {
    type Output = Result<T, PreloadError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PreloadError::Load(e)),
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(_) => Err(PreloadError::Cancelled),
        })
    }
}

impl<T, E> fmt::Debug for Preload<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preload")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Start a load immediately on the current tokio runtime.
///
/// The load begins as a side effect of calling this function, whether or not
/// the returned handle is ever awaited. Use it to warm whatever cache sits
/// behind the loader (an HTTP cache, a module registry) before the value is
/// needed. No retry or timeout is applied; wrap the loader first if wanted.
///
/// Must be called from within a tokio runtime.
///
/// ```rust
/// use loadwell::preload;
///
/// # tokio_test::block_on(async {
/// // Warm the dashboard bundle while the user hovers the link.
/// let dashboard = preload(|| async { Ok::<_, String>("dashboard bundle") });
///
/// // ...later, on click:
/// assert_eq!(dashboard.await, Ok("dashboard bundle"));
/// # });
/// ```
pub fn preload<L>(loader: L) -> Preload<L::Output, L::Error>
where
    L: Load + 'static,
    L::Output: 'static,
    L::Error: 'static,
{
    tracing::trace!("preloading");
    let handle = tokio::spawn(async move { loader.load().await });
    Preload { handle }
}

/// Load only when `condition` holds.
///
/// When `condition` is false the loader is never invoked and `Ok(None)` is
/// returned immediately.
///
/// ```rust
/// use loadwell::load_if;
///
/// # tokio_test::block_on(async {
/// let is_admin = false;
/// let admin_panel = load_if(is_admin, &|| async { Ok::<_, String>("admin panel") }).await;
///
/// assert_eq!(admin_panel, Ok(None));
/// # });
/// ```
pub async fn load_if<L: Load>(
    condition: bool,
    loader: &L,
) -> Result<Option<L::Output>, L::Error> {
    if !condition {
        return Ok(None);
    }
    loader.load().await.map(Some)
}

/// Load a fallback only when `is_supported` reports the capability missing.
///
/// The check runs exactly once. Typical use is loading a polyfill:
///
/// ```rust
/// use loadwell::load_unless;
///
/// # tokio_test::block_on(async {
/// let has_observer = || true;
/// let polyfill = load_unless(has_observer, &|| async { Ok::<_, String>("observer polyfill") }).await;
///
/// assert_eq!(polyfill, Ok(None));
/// # });
/// ```
pub async fn load_unless<F, L>(is_supported: F, loader: &L) -> Result<Option<L::Output>, L::Error>
where
    F: FnOnce() -> bool,
    L: Load,
{
    if is_supported() {
        return Ok(None);
    }
    tracing::info!("capability missing, loading fallback");
    let value = loader.load().await?;
    tracing::info!("fallback loaded");
    Ok(Some(value))
}
