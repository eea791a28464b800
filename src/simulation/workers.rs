//! Worker pool for CPU bound species simulations.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::common::error::{RiskError, RiskResult};

/// Build a dedicated pool; `size == 0` keeps rayon's default thread count.
pub fn pool(size: usize) -> RiskResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(size)
        .thread_name(|i| format!("risk-sim-{i}"))
        .build()
        .map_err(|err| RiskError::internal(format!("failed to build worker pool: {err}")))
}
