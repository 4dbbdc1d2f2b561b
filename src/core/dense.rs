//! In-memory operators over `faer` dense matrices.
//!
//! `faer::Mat<f64>` implements [`LinearOperator`] directly so that small systems
//! (and reference solutions in tests) can run through the same solver as the
//! distributed matrix. [`Regularized`] lifts any local operator to `A + λI`.

use crate::core::traits::LinearOperator;
use crate::error::{check_len, DcgError, Result};
use faer::Mat;

/// Packs a slice into an `n × 1` column matrix.
pub(crate) fn column(x: &[f64]) -> Mat<f64> {
    Mat::from_fn(x.len(), 1, |i, _| x[i])
}

/// Unpacks the first column of a matrix.
pub(crate) fn first_column(m: &Mat<f64>) -> Vec<f64> {
    (0..m.nrows()).map(|i| m[(i, 0)]).collect()
}

impl LinearOperator for Mat<f64> {
    fn nrows(&self) -> usize {
        Mat::nrows(self)
    }
    fn ncols(&self) -> usize {
        Mat::ncols(self)
    }
    fn multiply(&self, x: &[f64]) -> Result<Vec<f64>> {
        check_len("dense multiply operand", Mat::ncols(self), x.len())?;
        let y = self * &column(x);
        Ok(first_column(&y))
    }
}

/// `A + λI` over a local square operator.
pub struct Regularized<O> {
    inner: O,
    lambda: f64,
}

impl<O: LinearOperator> Regularized<O> {
    pub fn new(inner: O, lambda: f64) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(DcgError::InvalidInput(format!(
                "lambda must be a finite non-negative value, got {lambda}"
            )));
        }
        check_len("regularized operator shape", inner.nrows(), inner.ncols())?;
        Ok(Self { inner, lambda })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: LinearOperator> LinearOperator for Regularized<O> {
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
    fn multiply(&self, x: &[f64]) -> Result<Vec<f64>> {
        let ax = self.inner.multiply(x)?;
        if self.lambda == 0.0 {
            return Ok(ax);
        }
        Ok(crate::core::vector::axpy(self.lambda, x, &ax))
    }
}
