//! Core traits and local kernels.

pub mod dense;
pub mod traits;
pub mod vector;

pub use dense::Regularized;
pub use traits::{InnerProduct, LinearOperator};
