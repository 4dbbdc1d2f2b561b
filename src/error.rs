use thiserror::Error;

// Unified error type for distcg

#[derive(Error, Debug)]
pub enum DcgError {
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("vector source `{0}` is empty")]
    EmptyVector(String),
    #[error("operator is not positive definite along the search direction at iteration {iteration} (p^T A p = {curvature})")]
    IndefiniteOperator { iteration: usize, curvature: f64 },
    #[error("non-finite {quantity} at iteration {iteration}")]
    NonFinite {
        iteration: usize,
        quantity: &'static str,
    },
    #[error("storage error: {0}")]
    Storage(String),
    #[cfg(feature = "rayon")]
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, DcgError>;

/// Fails with `DimensionMismatch` unless `found == expected`.
pub(crate) fn check_len(context: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(DcgError::DimensionMismatch { context, expected, found });
    }
    Ok(())
}
