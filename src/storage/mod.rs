//! Storage collaborators of the solver.
//!
//! The solver core does not know any on-disk format. It loads the matrix and
//! the right-hand side, writes the solution, and removes its scratch location
//! through the traits below. [`MemoryStore`] implements all three in process.

use crate::error::Result;
use crate::matrix::PartitionedRows;

/// Source of row-partitioned matrices.
pub trait MatrixStore {
    /// Loads the matrix stored at `location`, which must have `ncol` columns.
    fn load_matrix(&self, location: &str, ncol: usize) -> Result<PartitionedRows>;
}

/// Labeled vector records.
pub trait VectorStore {
    /// First vector record at `location`; `EmptyVector` if there is none.
    fn load_vector(&self, location: &str) -> Result<Vec<f64>>;
    /// Replaces the contents of `location` with a single labeled record.
    fn save_vector(&self, location: &str, label: usize, vector: &[f64]) -> Result<()>;
}

/// Transient storage owned by a job.
pub trait ScratchSpace {
    /// Removes `location` and everything beneath it. Missing locations are
    /// not an error.
    fn remove(&self, location: &str) -> Result<()>;
}

pub mod memory;
pub use memory::MemoryStore;
