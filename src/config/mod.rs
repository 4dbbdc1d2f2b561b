pub mod options;

pub use options::{JobOptions, PartitionOptions, PreconditionerKind, SolverOptions};
