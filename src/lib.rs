//! distcg: distributed conjugate gradient over row-partitioned matrices
//!
//! This crate solves `(A + λI) x = b` (or the normal equations
//! `(AᵀA + λI) x = Aᵀb`) with a preconditioned conjugate-gradient method whose
//! only access to `A` is a distributed matrix-vector product. The matrix lives
//! in row partitions that are resized to the execution engine's parallelism
//! and optionally packed into dense `faer` blocks before multiplying.

pub mod parallel;

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod matrix;
pub mod operator;
pub mod partition;
pub mod preconditioner;
pub mod solver;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use self::core::*;
pub use error::*;
pub use matrix::*;
pub use operator::*;
pub use parallel::{Engine, ExecutionEngine, SerialEngine};
#[cfg(feature = "rayon")]
pub use parallel::RayonEngine;
pub use partition::*;
pub use preconditioner::*;
pub use solver::*;
pub use storage::*;
pub use utils::*;
