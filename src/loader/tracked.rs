//! Error tracking decorator.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::loader::trait_def::Load;
use crate::sink::{ErrorSink, NoopSink};

/// Lifecycle of a single tracked load.
///
/// ```text
/// Idle ──▶ Loading ──▶ Success
///                 └──▶ Failed   (reported to the sink, then propagated)
/// ```
///
/// `Success` and `Failed` are terminal for one call; calling `load` again
/// starts over at `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// No load has started yet.
    Idle,
    /// A load is in flight.
    Loading,
    /// The most recent load produced a value.
    Success,
    /// The most recent load produced an error.
    Failed,
}

impl LoadState {
    /// Returns true for `Success` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Success | LoadState::Failed)
    }

    fn as_u8(self) -> u8 {
        match self {
            LoadState::Idle => 0,
            LoadState::Loading => 1,
            LoadState::Success => 2,
            LoadState::Failed => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LoadState::Loading,
            2 => LoadState::Success,
            3 => LoadState::Failed,
            _ => LoadState::Idle,
        }
    }
}

/// A load whose failures are reported to an [`ErrorSink`].
///
/// On failure the sink receives the load's name and the error exactly once,
/// then the **same** error value is returned. Tracking never swallows or
/// alters an error.
///
/// The decorator also records the [`LoadState`] of its most recent call. When
/// a `Tracked` loader is shared by concurrent callers, [`state`](Tracked::state)
/// reflects whichever call changed it last.
///
/// ```rust
/// use loadwell::{Load, LoadExt, LoadState};
/// use std::sync::Mutex;
///
/// # tokio_test::block_on(async {
/// let reports = Mutex::new(Vec::new());
/// let sink = |name: &str, error: &String| {
///     reports.lock().unwrap().push(format!("{name}: {error}"));
/// };
///
/// let loader = (|| async { Err::<(), _>("network error".to_string()) })
///     .with_error_tracking("chart.js", sink);
///
/// assert_eq!(loader.load().await, Err("network error".to_string()));
/// assert_eq!(loader.state(), LoadState::Failed);
/// # drop(loader);
/// assert_eq!(*reports.lock().unwrap(), vec!["chart.js: network error"]);
/// # });
/// ```
pub struct Tracked<L, S = NoopSink> {
    inner: L,
    name: Cow<'static, str>,
    sink: S,
    state: AtomicU8,
}

impl<L: Load> Tracked<L> {
    /// Track `inner` under `name` with the no-op sink.
    pub fn new(inner: L, name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_sink(inner, name, NoopSink)
    }
}

impl<L: Load, S: ErrorSink<L::Error>> Tracked<L, S> {
    /// Track `inner` under `name`, reporting failures to `sink`.
    pub fn with_sink(inner: L, name: impl Into<Cow<'static, str>>, sink: S) -> Self {
        Self {
            inner,
            name: name.into(),
            sink,
            state: AtomicU8::new(LoadState::Idle.as_u8()),
        }
    }
}

impl<L, S> Tracked<L, S> {
    /// The logical name reported with failures.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// State of the most recent call.
    pub fn state(&self) -> LoadState {
        LoadState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The sink receiving failures.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn transition(&self, next: LoadState) {
        let prev = LoadState::from_u8(self.state.swap(next.as_u8(), Ordering::AcqRel));
        tracing::trace!(name = %self.name, from = ?prev, to = ?next, "load state changed");
    }
}

impl<L, S> Load for Tracked<L, S>
where
    L: Load,
    S: ErrorSink<L::Error>,
{
    type Output = L::Output;
    type Error = L::Error;

    fn load(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        async move {
            self.transition(LoadState::Loading);
            match self.inner.load().await {
                Ok(value) => {
                    self.transition(LoadState::Success);
                    Ok(value)
                }
                Err(error) => {
                    self.transition(LoadState::Failed);
                    tracing::error!(name = %self.name, "load failed");
                    self.sink.report(&self.name, &error);
                    Err(error)
                }
            }
        }
    }
}

impl<L: fmt::Debug, S: fmt::Debug> fmt::Debug for Tracked<L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("inner", &self.inner)
            .field("name", &self.name)
            .field("sink", &self.sink)
            .field("state", &self.state())
            .finish()
    }
}

/// Report failures of `loader` to `sink` under `name`.
///
/// Pass [`NoopSink`] when no observer is wanted.
pub fn with_error_tracking<L, S>(
    loader: L,
    name: impl Into<Cow<'static, str>>,
    sink: S,
) -> Tracked<L, S>
where
    L: Load,
    S: ErrorSink<L::Error>,
{
    Tracked::with_sink(loader, name, sink)
}
