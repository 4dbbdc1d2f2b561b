//! Solver, partitioning and job options.
//!
//! Every option struct is an explicit value handed to a constructor; nothing
//! is read from process-wide state. All of them implement `serde`'s traits
//! with field defaults, so a host program can load them from whatever format
//! it already uses for its configuration.

use serde::{Deserialize, Serialize};

use crate::partition::{AutoSizing, SplitRequest};
use crate::solver::DEFAULT_MAX_ERROR;

/// Preconditioner the job builds for the solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreconditionerKind {
    #[default]
    None,
    /// Inverse diagonal of the (regularized) operator.
    Jacobi,
}

/// Conjugate-gradient parameters for `(A + λI) x = b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Iteration budget; the column count when unset.
    pub max_iterations: Option<usize>,
    /// Residual-norm threshold.
    pub max_error: f64,
    /// Diagonal shift λ ≥ 0.
    pub lambda: f64,
    /// `false` solves the normal equations (AᵀA + λI) x = Aᵀb instead.
    pub symmetric: bool,
    pub preconditioner: PreconditionerKind,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: None,
            max_error: DEFAULT_MAX_ERROR,
            lambda: 0.0,
            symmetric: true,
            preconditioner: PreconditionerKind::None,
        }
    }
}

impl SolverOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = max_error;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    pub fn with_preconditioner(mut self, preconditioner: PreconditionerKind) -> Self {
        self.preconditioner = preconditioner;
        self
    }
}

/// How the distributed matrix is partitioned before multiplies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionOptions {
    /// Lower bound on the partition count (0 = unset). Takes precedence
    /// over `exact_splits`.
    pub min_splits: usize,
    /// Exact partition count (0 = unset).
    pub exact_splits: usize,
    /// Overrides the engine's parallelism hint.
    pub default_parallelism: Option<usize>,
    /// Pack partitions into dense blocks after sizing.
    pub blockify: bool,
    pub auto: AutoSizing,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            min_splits: 0,
            exact_splits: 0,
            default_parallelism: None,
            blockify: true,
            auto: AutoSizing::default(),
        }
    }
}

impl PartitionOptions {
    pub fn split_request(&self) -> SplitRequest {
        SplitRequest::from_counts(self.min_splits, self.exact_splits)
    }

    /// Parallelism hint: the override, else the engine's report, else 1.
    pub fn parallelism_hint(&self, engine_hint: Option<usize>) -> usize {
        self.default_parallelism.or(engine_hint).unwrap_or(1).max(1)
    }

    pub fn with_min_splits(mut self, min_splits: usize) -> Self {
        self.min_splits = min_splits;
        self
    }

    pub fn with_exact_splits(mut self, exact_splits: usize) -> Self {
        self.exact_splits = exact_splits;
        self
    }

    pub fn with_default_parallelism(mut self, parallelism: usize) -> Self {
        self.default_parallelism = Some(parallelism);
        self
    }

    pub fn with_blockify(mut self, blockify: bool) -> Self {
        self.blockify = blockify;
        self
    }
}

/// A complete solve job: where the data lives and how to solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Location of the matrix A.
    pub input: String,
    /// Location the solution x is written to.
    pub output: String,
    /// Scratch location, removed once the job finishes.
    pub temp_dir: String,
    /// Location of the right-hand side b.
    pub vector: String,
    pub num_rows: usize,
    pub num_cols: usize,
    #[serde(default)]
    pub solver: SolverOptions,
    #[serde(default)]
    pub partitions: PartitionOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = SolverOptions::default();
        assert_eq!(s.max_error, 1e-9);
        assert_eq!(s.lambda, 0.0);
        assert!(s.symmetric);
        assert_eq!(s.preconditioner, PreconditionerKind::None);
        let p = PartitionOptions::default();
        assert_eq!(p.split_request(), SplitRequest::Auto);
        assert_eq!(p.parallelism_hint(None), 1);
        assert_eq!(p.parallelism_hint(Some(0)), 1);
        assert_eq!(p.parallelism_hint(Some(8)), 8);
        assert_eq!(p.with_default_parallelism(3).parallelism_hint(Some(8)), 3);
    }

    #[test]
    fn job_options_from_json() {
        let json = r#"{
            "input": "mem://a",
            "output": "mem://x",
            "temp_dir": "mem://tmp",
            "vector": "mem://b",
            "num_rows": 4,
            "num_cols": 4,
            "solver": { "lambda": 0.5, "max_iterations": 10, "preconditioner": "jacobi" },
            "partitions": { "min_splits": 3, "exact_splits": 7 }
        }"#;
        let job: JobOptions = serde_json::from_str(json).unwrap();
        assert_eq!(job.solver.lambda, 0.5);
        assert_eq!(job.solver.max_iterations, Some(10));
        assert_eq!(job.solver.max_error, 1e-9);
        assert_eq!(job.solver.preconditioner, PreconditionerKind::Jacobi);
        assert_eq!(job.partitions.split_request(), SplitRequest::MinSplits(3));
        assert!(job.partitions.blockify);
        assert_eq!(job.partitions.auto, AutoSizing::default());
    }
}
