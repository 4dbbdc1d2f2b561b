//! Preconditioned Conjugate Gradient per Saad §9.2.
//!
//! Solves `A x = b` for a symmetric positive-definite operator, where `A` is
//! usually a regularized distributed matrix `(A + λI)`. Each iteration calls
//! `multiply` once and the preconditioner once, and replaces the state vectors
//! (x, r, z, p) with freshly computed ones.
//!
//! Termination:
//! - the residual norm drops below `max_error` (or reaches exactly zero):
//!   converged;
//! - the iteration budget runs out: the last iterate is returned with
//!   `SolveStats::converged == false`. This is not an error;
//! - `pᵀ A p` is zero or non-finite: the operator is not positive definite
//!   along the search direction and the solve fails with
//!   [`DcgError::IndefiniteOperator`].

use tracing::{debug, debug_span, trace, warn};

use crate::config::SolverOptions;
use crate::core::traits::LinearOperator;
use crate::core::vector::{axpy, dot, norm, xpby};
use crate::error::{check_len, DcgError, Result};
use crate::preconditioner::Preconditioning;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveStats};

/// Residual-norm threshold used when the caller does not pick one.
pub const DEFAULT_MAX_ERROR: f64 = 1e-9;

pub struct ConjugateGradientSolver {
    /// Iteration budget; `None` means the operator's column count.
    pub max_iterations: Option<usize>,
    pub max_error: f64,
    pub monitor: Option<Box<dyn FnMut(usize, f64)>>,
    pub residual_history: Vec<f64>,
}

impl ConjugateGradientSolver {
    pub fn new(max_error: f64, max_iterations: usize) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            max_error,
            monitor: None,
            residual_history: Vec::new(),
        }
    }

    pub fn from_options(options: &SolverOptions) -> Self {
        Self {
            max_iterations: options.max_iterations,
            max_error: options.max_error,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = max_error;
        self
    }

    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, f64) + 'static,
    {
        self.monitor = Some(Box::new(f));
        self
    }

    /// Solves from the zero vector and returns the solution with its stats.
    pub fn solve_from_zero<O: LinearOperator + ?Sized>(
        &mut self,
        a: &O,
        pc: &Preconditioning,
        b: &[f64],
    ) -> Result<(Vec<f64>, SolveStats)> {
        let mut x = vec![0.0; a.ncols()];
        let stats = self.solve(a, pc, b, &mut x)?;
        Ok((x, stats))
    }

    fn convergence(&self, n: usize) -> Result<Convergence> {
        if self.max_error.is_nan() {
            return Err(DcgError::InvalidInput("max_error must not be NaN".into()));
        }
        let max_iters = self.max_iterations.unwrap_or(n);
        if max_iters == 0 {
            return Err(DcgError::InvalidInput("max_iterations must be positive".into()));
        }
        Ok(Convergence { max_error: self.max_error, max_iters })
    }

    fn record(&mut self, iteration: usize, res_norm: f64) {
        if let Some(ref mut monitor) = self.monitor {
            monitor(iteration, res_norm);
        }
        self.residual_history.push(res_norm);
    }
}

impl Default for ConjugateGradientSolver {
    fn default() -> Self {
        Self {
            max_iterations: None,
            max_error: DEFAULT_MAX_ERROR,
            monitor: None,
            residual_history: Vec::new(),
        }
    }
}

impl<O: LinearOperator + ?Sized> LinearSolver<O> for ConjugateGradientSolver {
    fn solve(&mut self, a: &O, pc: &Preconditioning, b: &[f64], x: &mut [f64]) -> Result<SolveStats> {
        let n = a.ncols();
        check_len("square operator", a.nrows(), n)?;
        check_len("right-hand side", n, b.len())?;
        check_len("initial guess", n, x.len())?;
        let conv = self.convergence(n)?;
        let _span = debug_span!("conjugate_gradient", n, max_iterations = conv.max_iters).entered();
        self.residual_history.clear();

        let mut x_k = x.to_vec();
        let ax = a.multiply(&x_k)?;
        check_len("operator product", n, ax.len())?;
        let mut r = xpby(b, -1.0, &ax);
        let mut res_norm = norm(&r);
        self.record(0, res_norm);
        if conv.is_converged(res_norm) {
            debug!(residual = res_norm, "initial guess already satisfies the tolerance");
            return Ok(SolveStats { iterations: 0, final_residual: res_norm, converged: true });
        }

        let mut z = pc.apply(&r)?;
        check_len("preconditioned residual", n, z.len())?;
        let mut p = z.clone();
        let mut rho = dot(&r, &z);
        let mut stats = SolveStats { iterations: 0, final_residual: res_norm, converged: false };

        for k in 0..conv.max_iters {
            let iteration = k + 1;
            let q = a.multiply(&p)?;
            check_len("operator product", n, q.len())?;
            let curvature = dot(&p, &q);
            if curvature == 0.0 || !curvature.is_finite() {
                return Err(DcgError::IndefiniteOperator { iteration, curvature });
            }
            let alpha = rho / curvature;
            if !alpha.is_finite() {
                return Err(DcgError::NonFinite { iteration, quantity: "step size" });
            }
            x_k = axpy(alpha, &p, &x_k);
            r = axpy(-alpha, &q, &r);
            res_norm = norm(&r);
            trace!(iteration, residual = res_norm);
            self.record(iteration, res_norm);

            stats = conv.check(res_norm, iteration);
            if stats.converged {
                debug!(iterations = iteration, residual = res_norm, "conjugate gradient converged");
                x.copy_from_slice(&x_k);
                return Ok(stats);
            }

            z = pc.apply(&r)?;
            check_len("preconditioned residual", n, z.len())?;
            let rho_next = dot(&r, &z);
            let beta = rho_next / rho;
            if !beta.is_finite() {
                return Err(DcgError::NonFinite { iteration, quantity: "direction update" });
            }
            p = xpby(&z, beta, &p);
            rho = rho_next;
        }

        warn!(
            iterations = stats.iterations,
            residual = stats.final_residual,
            max_error = conv.max_error,
            "iteration budget exhausted before reaching the tolerance"
        );
        x.copy_from_slice(&x_k);
        Ok(stats)
    }
}
