//! Concurrent batch loading.
//!
//! - `load_all` - Run all loads, fail fast on the first error
//! - `load_all_settled` - Run all loads, keep every outcome
//!
//! Both poll their loads concurrently inside the caller's task; nothing is
//! spawned. Results keep the order of the input, whatever order the loads
//! finish in.

use futures::future::{join_all, try_join_all};

use crate::loader::trait_def::Load;

/// Run loads concurrently, failing fast on the first error.
///
/// Returns `Ok(values)` in input order when every load succeeds. As soon as
/// any load fails, its error is returned without waiting for the others; the
/// loads still in flight are dropped and any values already produced are
/// discarded. Partial results are never returned.
///
/// Loads of different types need boxing, see
/// [`LoadExt::boxed`](crate::LoadExt::boxed).
///
/// # Example
///
/// ```rust
/// use loadwell::load_all;
///
/// # tokio_test::block_on(async {
/// let fetch = |name: &'static str| move || async move { Ok::<_, String>(name) };
///
/// let modules = load_all(vec![fetch("chart.js"), fetch("mapbox-gl")]).await;
/// assert_eq!(modules, Ok(vec!["chart.js", "mapbox-gl"]));
/// # });
/// ```
pub async fn load_all<I>(
    loaders: I,
) -> Result<Vec<<I::Item as Load>::Output>, <I::Item as Load>::Error>
where
    I: IntoIterator,
    I::Item: Load,
{
    let loaders: Vec<I::Item> = loaders.into_iter().collect();
    tracing::debug!(count = loaders.len(), "loading batch");
    try_join_all(loaders.iter().map(|loader| loader.load())).await
}

/// Run loads concurrently and wait for every one of them.
///
/// Unlike [`load_all`], a failure does not stop the batch: each slot of the
/// returned vector holds the outcome of the load at the same position.
///
/// # Example
///
/// ```rust
/// use loadwell::{load_all_settled, BoxedLoader, LoadExt};
///
/// # tokio_test::block_on(async {
/// let loaders: Vec<BoxedLoader<i32, String>> = vec![
///     (|| async { Ok::<_, String>(1) }).boxed(),
///     (|| async { Err::<i32, _>("offline".to_string()) }).boxed(),
/// ];
///
/// let outcomes = load_all_settled(loaders).await;
/// assert_eq!(outcomes, vec![Ok(1), Err("offline".to_string())]);
/// # });
/// ```
pub async fn load_all_settled<I>(
    loaders: I,
) -> Vec<Result<<I::Item as Load>::Output, <I::Item as Load>::Error>>
where
    I: IntoIterator,
    I::Item: Load,
{
    let loaders: Vec<I::Item> = loaders.into_iter().collect();
    join_all(loaders.iter().map(|loader| loader.load())).await
}
