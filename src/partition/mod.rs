//! Partition sizing for distributed row collections.

pub mod policy;

pub use policy::{Adjustment, AutoSizing, PartitionPolicy, SplitRequest};
