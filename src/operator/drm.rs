//! Distributed row matrix as a linear operator.
//!
//! [`DistributedRowMatrix`] wraps a [`PartitionedRows`] collection together
//! with its logical shape, a regularization λ and an execution engine, and
//! exposes `multiply` for the solver:
//!
//! - [`OperatorForm::Direct`]: `(A + λI) v` (A must be square);
//! - [`OperatorForm::NormalEquations`]: `(AᵀA + λI) v`, for rectangular or
//!   non-symmetric A.
//!
//! Each product broadcasts `v` to every partition, computes the partition's
//! slice locally and reduces; the `λ v` term is added afterwards without any
//! partition work. On construction the collection is resized by the
//! [`PartitionPolicy`] against the engine's parallelism hint and, if
//! requested, packed into dense blocks.

use tracing::{debug, trace};

use crate::config::PartitionOptions;
use crate::core::traits::LinearOperator;
use crate::core::vector::axpy;
use crate::error::{check_len, DcgError, Result};
use crate::matrix::PartitionedRows;
use crate::parallel::ExecutionEngine;
use crate::partition::PartitionPolicy;
use crate::preconditioner::DiagonalSource;
use crate::storage::MatrixStore;

/// Which operator `multiply` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorForm {
    /// `A + λI`
    #[default]
    Direct,
    /// `AᵀA + λI`
    NormalEquations,
}

pub struct DistributedRowMatrix<E> {
    rows: PartitionedRows,
    scratch: String,
    nrows: usize,
    ncols: usize,
    lambda: f64,
    form: OperatorForm,
    engine: E,
    options: PartitionOptions,
    policy: PartitionPolicy,
}

impl<E: ExecutionEngine> DistributedRowMatrix<E> {
    /// Loads the matrix at `input` and prepares it for multiplies.
    /// `scratch` is recorded for the caller, who removes it after use.
    pub fn open<S: MatrixStore + ?Sized>(
        store: &S,
        input: &str,
        scratch: &str,
        nrows: usize,
        ncols: usize,
        engine: E,
        options: PartitionOptions,
    ) -> Result<Self> {
        let rows = store.load_matrix(input, ncols)?;
        Self::from_rows(rows, scratch, nrows, ncols, engine, options)
    }

    pub fn from_rows(
        rows: PartitionedRows,
        scratch: &str,
        nrows: usize,
        ncols: usize,
        engine: E,
        options: PartitionOptions,
    ) -> Result<Self> {
        check_len("matrix columns", ncols, rows.ncol())?;
        if let Some(max) = rows.max_row_index() {
            if max >= nrows {
                return Err(DcgError::InvalidInput(format!(
                    "row index {max} out of range for a matrix with {nrows} rows"
                )));
            }
        }
        let policy = PartitionPolicy::new(options.auto);
        let mut drm = Self {
            rows,
            scratch: scratch.to_string(),
            nrows,
            ncols,
            lambda: 0.0,
            form: OperatorForm::Direct,
            engine,
            options,
            policy,
        };
        drm.rebalance();
        Ok(drm)
    }

    pub fn with_lambda(mut self, lambda: f64) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(DcgError::InvalidInput(format!(
                "lambda must be a finite non-negative value, got {lambda}"
            )));
        }
        self.lambda = lambda;
        self.check_shape()?;
        Ok(self)
    }

    pub fn with_form(mut self, form: OperatorForm) -> Result<Self> {
        self.form = form;
        self.check_shape()?;
        Ok(self)
    }

    fn check_shape(&self) -> Result<()> {
        if self.form == OperatorForm::Direct && self.lambda != 0.0 {
            check_len("regularized matrix shape", self.nrows, self.ncols)?;
        }
        Ok(())
    }

    /// Resizes the partitions to the policy's target for the current
    /// engine, then blockifies if configured. Returns the partition count.
    pub fn rebalance(&mut self) -> usize {
        let hint = self.options.parallelism_hint(self.engine.default_parallelism());
        let request = self.options.split_request();
        let rows = std::mem::replace(&mut self.rows, PartitionedRows::empty(self.ncols));
        let (target, mut rows) = self.policy.adjust(rows, request, hint);
        if self.options.blockify {
            rows = rows.blockify();
        }
        debug!(
            partitions = target,
            hint,
            blockified = rows.is_blockified(),
            rows = rows.num_rows(),
            "distributed matrix ready"
        );
        self.rows = rows;
        target
    }

    pub fn rows(&self) -> &PartitionedRows {
        &self.rows
    }

    pub fn num_partitions(&self) -> usize {
        self.rows.num_partitions()
    }

    pub fn scratch_location(&self) -> &str {
        &self.scratch
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn form(&self) -> OperatorForm {
        self.form
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// `A v` (no regularization).
    pub fn times(&self, v: &[f64]) -> Result<Vec<f64>> {
        self.rows.multiply(&self.engine, v, self.nrows)
    }

    /// `AᵀA v` (no regularization).
    pub fn times_squared(&self, v: &[f64]) -> Result<Vec<f64>> {
        self.rows.times_squared(&self.engine, v)
    }

    /// `Aᵀ b`
    pub fn transpose_times(&self, b: &[f64]) -> Result<Vec<f64>> {
        check_len("transpose-times operand", self.nrows, b.len())?;
        self.rows.transpose_times(&self.engine, b)
    }
}

impl<E: ExecutionEngine> LinearOperator for DistributedRowMatrix<E> {
    fn nrows(&self) -> usize {
        match self.form {
            OperatorForm::Direct => self.nrows,
            OperatorForm::NormalEquations => self.ncols,
        }
    }

    fn ncols(&self) -> usize {
        self.ncols
    }

    fn multiply(&self, v: &[f64]) -> Result<Vec<f64>> {
        let product = match self.form {
            OperatorForm::Direct => self.times(v)?,
            OperatorForm::NormalEquations => self.times_squared(v)?,
        };
        trace!(partitions = self.rows.num_partitions(), "distributed multiply");
        if self.lambda == 0.0 {
            return Ok(product);
        }
        Ok(axpy(self.lambda, v, &product))
    }
}

impl<E: ExecutionEngine> DiagonalSource for DistributedRowMatrix<E> {
    fn diagonal(&self) -> Result<Vec<f64>> {
        let diag = match self.form {
            OperatorForm::Direct => self.rows.diagonal(&self.engine, self.nrows.min(self.ncols)),
            OperatorForm::NormalEquations => self.rows.column_squares(&self.engine),
        };
        Ok(diag.into_iter().map(|d| d + self.lambda).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{IndexedRow, RowVector};
    use crate::parallel::SerialEngine;
    use approx::assert_abs_diff_eq;

    fn tridiagonal(n: usize, partitions: usize) -> PartitionedRows {
        let rows = (0..n)
            .map(|i| {
                let mut indices = Vec::new();
                let mut values = Vec::new();
                if i > 0 {
                    indices.push(i - 1);
                    values.push(-1.0);
                }
                indices.push(i);
                values.push(2.0);
                if i + 1 < n {
                    indices.push(i + 1);
                    values.push(-1.0);
                }
                IndexedRow::new(i, RowVector::sparse(n, indices, values).unwrap())
            })
            .collect();
        PartitionedRows::from_rows(n, rows, partitions).unwrap()
    }

    fn options() -> PartitionOptions {
        PartitionOptions::default().with_default_parallelism(4)
    }

    #[test]
    fn construction_sizes_and_blockifies() {
        let drm = DistributedRowMatrix::from_rows(tridiagonal(12, 1), "tmp", 12, 12, SerialEngine, options()).unwrap();
        // hint 4 -> ceil(3.8) = 4
        assert_eq!(drm.num_partitions(), 4);
        assert!(drm.rows().is_blockified());
        assert_eq!(drm.rows().num_rows(), 12);
        assert_eq!(drm.scratch_location(), "tmp");
    }

    #[test]
    fn row_wise_and_blockified_multiply_agree() {
        let v: Vec<f64> = (0..10).map(|i| (i as f64).sin()).collect();
        let blocked = DistributedRowMatrix::from_rows(tridiagonal(10, 3), "t", 10, 10, SerialEngine, options()).unwrap();
        let plain = DistributedRowMatrix::from_rows(
            tridiagonal(10, 3),
            "t",
            10,
            10,
            SerialEngine,
            options().with_blockify(false),
        )
        .unwrap();
        assert!(!plain.rows().is_blockified());
        let a = blocked.multiply(&v).unwrap();
        let b = plain.multiply(&v).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn lambda_shifts_the_product() {
        let drm = DistributedRowMatrix::from_rows(tridiagonal(3, 1), "t", 3, 3, SerialEngine, options())
            .unwrap()
            .with_lambda(1.5)
            .unwrap();
        let y = drm.multiply(&[1.0, 1.0, 1.0]).unwrap();
        assert_abs_diff_eq!(y[0], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], 1.5, epsilon = 1e-12);
        assert_eq!(drm.diagonal().unwrap(), vec![3.5, 3.5, 3.5]);
    }

    #[test]
    fn rejects_inconsistent_shapes() {
        assert!(DistributedRowMatrix::from_rows(tridiagonal(4, 1), "t", 3, 4, SerialEngine, options()).is_err());
        assert!(DistributedRowMatrix::from_rows(tridiagonal(4, 1), "t", 4, 5, SerialEngine, options()).is_err());
        let rect = PartitionedRows::from_rows(2, vec![IndexedRow::dense(0, vec![1.0, 2.0])], 1).unwrap();
        let drm = DistributedRowMatrix::from_rows(rect, "t", 3, 2, SerialEngine, options()).unwrap();
        assert!(drm.with_lambda(1.0).is_err());
        assert!(
            DistributedRowMatrix::from_rows(tridiagonal(2, 1), "t", 2, 2, SerialEngine, options())
                .unwrap()
                .with_lambda(-1.0)
                .is_err()
        );
    }

    #[test]
    fn normal_equations_form() {
        // A = [[1, 2], [3, 4], [5, 6]]
        let rows = vec![
            IndexedRow::dense(0, vec![1.0, 2.0]),
            IndexedRow::dense(1, vec![3.0, 4.0]),
            IndexedRow::dense(2, vec![5.0, 6.0]),
        ];
        let drm = DistributedRowMatrix::from_rows(
            PartitionedRows::from_rows(2, rows, 2).unwrap(),
            "t",
            3,
            2,
            SerialEngine,
            options(),
        )
        .unwrap()
        .with_form(OperatorForm::NormalEquations)
        .unwrap()
        .with_lambda(1.0)
        .unwrap();
        assert_eq!(drm.nrows(), 2);
        // AᵀA = [[35, 44], [44, 56]]
        let y = drm.multiply(&[1.0, 0.0]).unwrap();
        assert_abs_diff_eq!(y[0], 36.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], 44.0, epsilon = 1e-12);
        assert_eq!(drm.diagonal().unwrap(), vec![36.0, 57.0]);
        assert_eq!(drm.transpose_times(&[1.0, 1.0, 1.0]).unwrap(), vec![9.0, 12.0]);
        assert!(drm.transpose_times(&[1.0]).is_err());
    }
}
