// Jacobi preconditioner implementation

use crate::core::Regularized;
use crate::error::{check_len, Result};
use crate::preconditioner::Preconditioner;
use faer::Mat;

/// Operators that can report their main diagonal without a full multiply sweep.
pub trait DiagonalSource {
    fn diagonal(&self) -> Result<Vec<f64>>;
}

impl DiagonalSource for Mat<f64> {
    fn diagonal(&self) -> Result<Vec<f64>> {
        let n = self.nrows().min(self.ncols());
        Ok((0..n).map(|i| self[(i, i)]).collect())
    }
}

impl<O: DiagonalSource + crate::core::LinearOperator> DiagonalSource for Regularized<O> {
    fn diagonal(&self) -> Result<Vec<f64>> {
        let lambda = self.lambda();
        Ok(self.inner().diagonal()?.into_iter().map(|d| d + lambda).collect())
    }
}

/// Jacobi preconditioner: M⁻¹ = D⁻¹
///
/// Zero diagonal entries pass the residual component through unchanged.
#[derive(Debug, Clone)]
pub struct Jacobi {
    pub(crate) inv_diag: Vec<f64>,
}

impl Jacobi {
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let inv_diag = diag
            .iter()
            .map(|&d| if d != 0.0 { 1.0 / d } else { 1.0 })
            .collect();
        Self { inv_diag }
    }

    /// Reads the diagonal from `a` (including any regularization it applies).
    pub fn setup<A: DiagonalSource + ?Sized>(a: &A) -> Result<Self> {
        Ok(Self::from_diagonal(&a.diagonal()?))
    }
}

impl Preconditioner for Jacobi {
    fn apply(&self, r: &[f64]) -> Result<Vec<f64>> {
        check_len("jacobi residual", self.inv_diag.len(), r.len())?;
        Ok(r.iter().zip(&self.inv_diag).map(|(ri, di)| ri * di).collect())
    }
}
