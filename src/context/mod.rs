//! Job contexts: wiring between storage, the distributed operator and the solver.
//!
//! [`SolverJob`] loads the right-hand side, builds a [`DistributedRowMatrix`]
//! over the stored matrix, runs the conjugate-gradient solver and writes the
//! solution back.
//!
//! [`DistributedRowMatrix`]: crate::operator::DistributedRowMatrix

pub mod job_context;
pub use job_context::SolverJob;
