//! Iterative solver interfaces.

use crate::core::traits::LinearOperator;
use crate::error::Result;
use crate::preconditioner::Preconditioning;
use crate::utils::convergence::SolveStats;

/// Common interface for iterative solvers over a [`LinearOperator`].
pub trait LinearSolver<O: LinearOperator + ?Sized> {
    /// Solve A·x = b, using `x` as the initial guess and writing the result
    /// into it. Returns iteration stats (including convergence info).
    fn solve(&mut self, a: &O, pc: &Preconditioning, b: &[f64], x: &mut [f64]) -> Result<SolveStats>;
}

pub mod cg;
pub use cg::{ConjugateGradientSolver, DEFAULT_MAX_ERROR};
