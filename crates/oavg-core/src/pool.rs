use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::error::TransformError;

/// Default number of worker threads for per-operation work.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Run `f` over `items` on a bounded pool and collect results in input order.
///
/// The first error aborts the batch; remaining results are discarded.
pub fn run_bounded<T, R, E, F>(items: &[T], concurrency: usize, f: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send + From<TransformError>,
    F: Fn(&T) -> Result<R, E> + Sync + Send,
{
    if concurrency <= 1 || items.len() <= 1 {
        return items.iter().map(f).collect();
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .build()
        .map_err(|e| E::from(TransformError::Pool(e.to_string())))?;

    pool.install(|| items.par_iter().map(f).collect())
}
