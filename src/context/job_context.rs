//! Solve jobs over stored matrices.
//!
//! # Usage
//!
//! 1. Put the matrix and the right-hand side into a store implementing
//!    [`MatrixStore`], [`VectorStore`] and [`ScratchSpace`].
//! 2. Build a [`SolverJob`] with that store and an execution engine.
//! 3. Call [`SolverJob::run`] with a [`JobOptions`], or [`SolverJob::run_job`]
//!    when `b` is already in memory.

use tracing::info;

use crate::config::{JobOptions, PartitionOptions, PreconditionerKind, SolverOptions};
use crate::core::traits::LinearOperator;
use crate::error::{check_len, Result};
use crate::operator::{DistributedRowMatrix, OperatorForm};
use crate::parallel::ExecutionEngine;
use crate::preconditioner::{Jacobi, Preconditioner, Preconditioning};
use crate::solver::ConjugateGradientSolver;
use crate::storage::{MatrixStore, ScratchSpace, VectorStore};
use crate::utils::convergence::SolveStats;

/// Label of the single solution record written by [`SolverJob::run`].
pub const SOLUTION_LABEL: usize = 0;

pub struct SolverJob<S, E> {
    store: S,
    engine: E,
}

impl<S, E> SolverJob<S, E>
where
    S: MatrixStore + VectorStore + ScratchSpace,
    E: ExecutionEngine,
{
    pub fn new(store: S, engine: E) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Solves `A x = b` for the matrix stored at `input`, with default
    /// partitioning and no regularization. `max_iterations` defaults to
    /// `num_cols`.
    #[allow(clippy::too_many_arguments)]
    pub fn run_job(
        &self,
        input: &str,
        temp: &str,
        num_rows: usize,
        num_cols: usize,
        b: &[f64],
        preconditioner: Option<Box<dyn Preconditioner>>,
        max_iterations: Option<usize>,
        max_error: f64,
    ) -> Result<Vec<f64>> {
        let solver = SolverOptions { max_iterations, max_error, ..SolverOptions::default() };
        let drm = self.operator(input, temp, num_rows, num_cols, &solver, &PartitionOptions::default())?;
        let (x, _) = self.solve_with(&drm, b, &Preconditioning::from(preconditioner), &solver)?;
        Ok(x)
    }

    /// Builds the distributed operator the options describe.
    ///
    /// With `symmetric == false` the operator applies `AᵀA + λI`.
    pub fn operator(
        &self,
        input: &str,
        temp: &str,
        num_rows: usize,
        num_cols: usize,
        solver: &SolverOptions,
        partitions: &PartitionOptions,
    ) -> Result<DistributedRowMatrix<&E>> {
        let form = if solver.symmetric {
            check_len("symmetric matrix shape", num_rows, num_cols)?;
            OperatorForm::Direct
        } else {
            OperatorForm::NormalEquations
        };
        DistributedRowMatrix::open(&self.store, input, temp, num_rows, num_cols, &self.engine, partitions.clone())?
            .with_form(form)?
            .with_lambda(solver.lambda)
    }

    /// Runs the solver on a prepared operator. For the normal-equations form
    /// `b` is first mapped to `Aᵀ b`.
    pub fn solve_with(
        &self,
        drm: &DistributedRowMatrix<&E>,
        b: &[f64],
        pc: &Preconditioning,
        solver: &SolverOptions,
    ) -> Result<(Vec<f64>, SolveStats)> {
        let rhs = match drm.form() {
            OperatorForm::Direct => b.to_vec(),
            OperatorForm::NormalEquations => drm.transpose_times(b)?,
        };
        check_len("right-hand side", drm.nrows(), rhs.len())?;
        ConjugateGradientSolver::from_options(solver).solve_from_zero(drm, pc, &rhs)
    }

    /// Full job: load `b`, solve, save `x` as one labeled record, and remove
    /// the scratch location (also when the solve fails).
    pub fn run(&self, job: &JobOptions) -> Result<SolveStats> {
        info!(
            input = %job.input,
            rows = job.num_rows,
            cols = job.num_cols,
            lambda = job.solver.lambda,
            symmetric = job.solver.symmetric,
            "starting conjugate gradient job"
        );
        let outcome = self.solve_job(job);
        let removed = self.store.remove(&job.temp_dir);
        let (x, stats) = outcome?;
        removed?;
        self.store.save_vector(&job.output, SOLUTION_LABEL, &x)?;
        info!(
            output = %job.output,
            iterations = stats.iterations,
            residual = stats.final_residual,
            converged = stats.converged,
            "conjugate gradient job finished"
        );
        Ok(stats)
    }

    fn solve_job(&self, job: &JobOptions) -> Result<(Vec<f64>, SolveStats)> {
        let b = self.store.load_vector(&job.vector)?;
        check_len("right-hand side", job.num_rows, b.len())?;
        let drm = self.operator(&job.input, &job.temp_dir, job.num_rows, job.num_cols, &job.solver, &job.partitions)?;
        let pc = match job.solver.preconditioner {
            PreconditionerKind::None => Preconditioning::Identity,
            PreconditionerKind::Jacobi => Preconditioning::custom(Jacobi::setup(&drm)?),
        };
        self.solve_with(&drm, &b, &pc, &job.solver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DcgError;
    use crate::matrix::IndexedRow;
    use crate::parallel::SerialEngine;
    use crate::storage::MemoryStore;
    use approx::assert_abs_diff_eq;

    fn store_with_identity() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .put_matrix(
                "a",
                2,
                vec![vec![IndexedRow::dense(0, vec![1.0, 0.0])], vec![IndexedRow::dense(1, vec![0.0, 1.0])]],
            )
            .unwrap();
        store
    }

    fn job() -> JobOptions {
        JobOptions {
            input: "a".into(),
            output: "x".into(),
            temp_dir: "tmp".into(),
            vector: "b".into(),
            num_rows: 2,
            num_cols: 2,
            solver: SolverOptions::default().with_max_error(1e-10),
            partitions: PartitionOptions::default(),
        }
    }

    #[test]
    fn run_job_solves_identity() {
        let job = SolverJob::new(store_with_identity(), SerialEngine);
        let x = job.run_job("a", "tmp", 2, 2, &[4.0, 6.0], None, Some(2), 1e-10).unwrap();
        assert_eq!(x, vec![4.0, 6.0]);
    }

    #[test]
    fn run_writes_solution_and_clears_scratch() {
        let store = store_with_identity();
        store.save_vector("b", 0, &[4.0, 6.0]).unwrap();
        store.save_vector("tmp/partial", 0, &[0.0]).unwrap();
        let solver_job = SolverJob::new(store, SerialEngine);
        let stats = solver_job.run(&job()).unwrap();
        assert!(stats.converged);
        let store = solver_job.store();
        assert_eq!(store.vector_records("x").unwrap(), vec![(SOLUTION_LABEL, vec![4.0, 6.0])]);
        assert!(!store.contains("tmp/partial").unwrap());
    }

    #[test]
    fn empty_rhs_fails_and_still_clears_scratch() {
        let store = store_with_identity();
        store.put_vectors("b", Vec::new()).unwrap();
        store.save_vector("tmp", 0, &[0.0]).unwrap();
        let solver_job = SolverJob::new(store, SerialEngine);
        assert!(matches!(solver_job.run(&job()), Err(DcgError::EmptyVector(_))));
        assert!(!solver_job.store().contains("tmp").unwrap());
        assert!(!solver_job.store().contains("x").unwrap());
    }

    #[test]
    fn lambda_and_jacobi_through_options() {
        let store = store_with_identity();
        store.save_vector("b", 0, &[4.0, 6.0]).unwrap();
        let mut options = job();
        options.solver = options.solver.with_lambda(1.0).with_preconditioner(PreconditionerKind::Jacobi);
        let solver_job = SolverJob::new(store, SerialEngine);
        solver_job.run(&options).unwrap();
        let x = solver_job.store().load_vector("x").unwrap();
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn symmetric_job_requires_square_matrix() {
        let job = SolverJob::new(store_with_identity(), SerialEngine);
        let err = job
            .operator("a", "tmp", 3, 2, &SolverOptions::default(), &PartitionOptions::default())
            .err();
        assert!(matches!(err, Some(DcgError::DimensionMismatch { .. })));
    }

    /// Store whose scratch removal always fails.
    struct StuckScratch(MemoryStore);

    impl MatrixStore for StuckScratch {
        fn load_matrix(&self, location: &str, ncol: usize) -> Result<crate::matrix::PartitionedRows> {
            self.0.load_matrix(location, ncol)
        }
    }

    impl VectorStore for StuckScratch {
        fn load_vector(&self, location: &str) -> Result<Vec<f64>> {
            self.0.load_vector(location)
        }
        fn save_vector(&self, location: &str, label: usize, vector: &[f64]) -> Result<()> {
            self.0.save_vector(location, label, vector)
        }
    }

    impl ScratchSpace for StuckScratch {
        fn remove(&self, location: &str) -> Result<()> {
            Err(DcgError::Storage(format!("cannot remove `{location}`")))
        }
    }

    #[test]
    fn solve_error_wins_over_scratch_error() {
        let store = store_with_identity();
        store.put_vectors("b", Vec::new()).unwrap();
        let solver_job = SolverJob::new(StuckScratch(store), SerialEngine);
        assert!(matches!(solver_job.run(&job()), Err(DcgError::EmptyVector(_))));

        solver_job.store().0.save_vector("b", 0, &[4.0, 6.0]).unwrap();
        assert!(matches!(solver_job.run(&job()), Err(DcgError::Storage(_))));
        assert!(!solver_job.store().0.contains("x").unwrap());
    }
}
