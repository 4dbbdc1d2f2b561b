// rayon-based partition execution

use crate::error::Result;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Shared-memory engine: partitions become rayon tasks.
///
/// Without an explicit pool the global rayon pool is used and the
/// parallelism hint is the number of logical CPUs.
pub struct RayonEngine {
    pool: Option<ThreadPool>,
}

impl RayonEngine {
    pub fn new() -> Self {
        RayonEngine { pool: None }
    }

    /// Engine backed by a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new().num_threads(threads.max(1)).build()?;
        Ok(RayonEngine { pool: Some(pool) })
    }
}

impl Default for RayonEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl super::ExecutionEngine for RayonEngine {
    fn default_parallelism(&self) -> Option<usize> {
        match &self.pool {
            Some(pool) => Some(pool.current_num_threads()),
            None => Some(num_cpus::get()),
        }
    }

    fn map_partitions<P, R, F>(&self, partitions: &[P], f: F) -> Vec<R>
    where
        P: Sync,
        R: Send,
        F: Fn(usize, &P) -> R + Sync + Send,
    {
        let run = || -> Vec<R> { partitions.par_iter().enumerate().map(|(i, p)| f(i, p)).collect() };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
