//! Core linear-algebra traits for distcg.

use crate::error::Result;

/// A square-or-rectangular linear operator y ← A x.
///
/// Implementations may be local (`faer::Mat`) or distributed
/// (`DistributedRowMatrix`); the solver only sees this seam.
pub trait LinearOperator {
    /// Number of rows (length of the product).
    fn nrows(&self) -> usize;
    /// Number of columns (length of the operand).
    fn ncols(&self) -> usize;
    /// Compute A · x as a fresh vector.
    fn multiply(&self, x: &[f64]) -> Result<Vec<f64>>;
}

impl<O: LinearOperator + ?Sized> LinearOperator for &O {
    fn nrows(&self) -> usize {
        (**self).nrows()
    }
    fn ncols(&self) -> usize {
        (**self).ncols()
    }
    fn multiply(&self, x: &[f64]) -> Result<Vec<f64>> {
        (**self).multiply(x)
    }
}

/// Inner products & norms.
pub trait InnerProduct<V: ?Sized> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}
