//! Scoped worker pools
//!
//! Every batch operation builds its own rayon pool, runs inside it and drops
//! it on return, so a pool never outlives the call that asked for it.

use crate::core::error::{HicToolsError, Result, WorkerError};
use rayon::prelude::*;

/// Build a pool with `threads` workers (0 = rayon default) and run `op` in it
pub fn with_pool<T, F>(threads: usize, op: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| WorkerError::PoolBuild(e.to_string()))?;

    pool.install(op)
}

/// Map `items` in parallel inside a scoped pool, keeping input order.
///
/// The first failing item aborts the batch; its error is wrapped in
/// [`WorkerError::Task`] with the item's index.
pub fn parallel_map<I, T, F>(threads: usize, items: &[I], f: F) -> Result<Vec<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<T> + Sync + Send,
{
    with_pool(threads, || {
        items
            .par_iter()
            .enumerate()
            .map(|(idx, item)| {
                f(item).map_err(|e| HicToolsError::from(WorkerError::task(idx, e)))
            })
            .collect()
    })
}
