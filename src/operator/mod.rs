//! Distributed linear operators.

pub mod drm;

pub use drm::{DistributedRowMatrix, OperatorForm};
