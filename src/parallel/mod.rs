//! Execution engines for partition-parallel work.
//!
//! The solver never schedules threads itself: every distributed operation is
//! described as a side-effect-free map over partitions and handed to an
//! [`ExecutionEngine`], which decides how the partitions run.

/// Runs partition-local work and reports the engine's baseline parallelism.
pub trait ExecutionEngine: Send + Sync {
    /// Baseline parallelism hint (number of workers); `None` if unknown.
    fn default_parallelism(&self) -> Option<usize>;

    /// Applies `f` to every `(partition id, partition)` and collects the
    /// results in partition order.
    fn map_partitions<P, R, F>(&self, partitions: &[P], f: F) -> Vec<R>
    where
        P: Sync,
        R: Send,
        F: Fn(usize, &P) -> R + Sync + Send;
}

/// Runs partitions one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialEngine;

impl ExecutionEngine for SerialEngine {
    fn default_parallelism(&self) -> Option<usize> {
        Some(1)
    }

    fn map_partitions<P, R, F>(&self, partitions: &[P], f: F) -> Vec<R>
    where
        P: Sync,
        R: Send,
        F: Fn(usize, &P) -> R + Sync + Send,
    {
        partitions.iter().enumerate().map(|(i, p)| f(i, p)).collect()
    }
}

#[cfg(feature = "rayon")]
pub mod rayon_engine;
#[cfg(feature = "rayon")]
pub use rayon_engine::RayonEngine;

/// Engine selected at runtime.
pub enum Engine {
    #[cfg(feature = "rayon")]
    Rayon(RayonEngine),
    Serial(SerialEngine),
}

impl Engine {
    /// The rayon engine when available, otherwise serial.
    pub fn detect() -> Self {
        #[cfg(feature = "rayon")]
        {
            Engine::Rayon(RayonEngine::new())
        }
        #[cfg(not(feature = "rayon"))]
        {
            Engine::Serial(SerialEngine)
        }
    }
}

impl ExecutionEngine for Engine {
    fn default_parallelism(&self) -> Option<usize> {
        match self {
            #[cfg(feature = "rayon")]
            Engine::Rayon(engine) => engine.default_parallelism(),
            Engine::Serial(engine) => engine.default_parallelism(),
        }
    }

    fn map_partitions<P, R, F>(&self, partitions: &[P], f: F) -> Vec<R>
    where
        P: Sync,
        R: Send,
        F: Fn(usize, &P) -> R + Sync + Send,
    {
        match self {
            #[cfg(feature = "rayon")]
            Engine::Rayon(engine) => engine.map_partitions(partitions, f),
            Engine::Serial(engine) => engine.map_partitions(partitions, f),
        }
    }
}

impl<E: ExecutionEngine> ExecutionEngine for &E {
    fn default_parallelism(&self) -> Option<usize> {
        (**self).default_parallelism()
    }

    fn map_partitions<P, R, F>(&self, partitions: &[P], f: F) -> Vec<R>
    where
        P: Sync,
        R: Send,
        F: Fn(usize, &P) -> R + Sync + Send,
    {
        (**self).map_partitions(partitions, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_engine_keeps_partition_order() {
        let parts = vec![vec![1, 2], vec![3], vec![]];
        let sums = SerialEngine.map_partitions(&parts, |i, p: &Vec<i32>| (i, p.iter().sum::<i32>()));
        assert_eq!(sums, vec![(0, 3), (1, 3), (2, 0)]);
        assert_eq!(SerialEngine.default_parallelism(), Some(1));
    }

    #[test]
    fn detected_engine_reports_parallelism() {
        let engine = Engine::detect();
        assert!(engine.default_parallelism().unwrap_or(1) >= 1);
        let out = engine.map_partitions(&[10usize, 20, 30], |i, p: &usize| i * 100 + p);
        assert_eq!(out, vec![10, 120, 230]);
    }
}
