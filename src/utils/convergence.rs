//! Convergence tracking & tolerance checks for the conjugate-gradient loop.

/// Stopping criteria: absolute residual-norm threshold and iteration budget.
#[derive(Debug, Clone, Copy)]
pub struct Convergence {
    pub max_error: f64,
    pub max_iters: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolveStats {
    pub iterations: usize,
    pub final_residual: f64,
    /// `false` when the budget ran out before the residual met the tolerance.
    pub converged: bool,
}

impl Convergence {
    /// A residual norm counts as converged when it is below `max_error`, or
    /// exactly zero (nothing left to reduce).
    pub fn is_converged(&self, res_norm: f64) -> bool {
        res_norm < self.max_error || res_norm == 0.0
    }

    /// Stats for residual `res_norm` after iteration `i`.
    pub fn check(&self, res_norm: f64, i: usize) -> SolveStats {
        SolveStats { iterations: i, final_residual: res_norm, converged: self.is_converged(res_norm) }
    }
}
