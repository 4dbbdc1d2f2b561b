//! Partition sizing policy for distributed row collections.
//!
//! Given the current partition count and a [`SplitRequest`], the policy picks a
//! target count and reshapes the collection to it:
//!
//! - growing is a full shuffle (blocks are decomposed into rows first);
//! - shrinking merges adjacent partitions and keeps a blockified layout
//!   blockified;
//! - an unchanged count is a no-op.
//!
//! # Auto sizing
//! Without an explicit request the target follows the engine's parallelism
//! hint `h`: with `x1 = fraction · h`, the target is `ceil(x1)` when the
//! current count is at most `ceil(x1)`, and `ceil(growth · x1)` otherwise.
//! The defaults are `fraction = 0.95` and `growth = 2.0`; see [`AutoSizing`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matrix::PartitionedRows;

/// Which partition count the caller asks for. Exactly one mode is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitRequest {
    /// Lower bound: never fewer than this many partitions.
    MinSplits(usize),
    /// Exactly this many partitions.
    ExactSplits(usize),
    /// Derive the count from the parallelism hint.
    #[default]
    Auto,
}

impl SplitRequest {
    /// Builds a request from the two optional counts (0 = unset).
    /// `min_splits` wins when both are set.
    pub fn from_counts(min_splits: usize, exact_splits: usize) -> Self {
        if min_splits > 0 {
            SplitRequest::MinSplits(min_splits)
        } else if exact_splits > 0 {
            SplitRequest::ExactSplits(exact_splits)
        } else {
            SplitRequest::Auto
        }
    }
}

/// Constants of the auto-sizing heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSizing {
    pub fraction: f64,
    pub growth: f64,
}

impl Default for AutoSizing {
    fn default() -> Self {
        Self { fraction: 0.95, growth: 2.0 }
    }
}

/// Transformation chosen for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Full shuffle into more partitions.
    Expand { from: usize, to: usize },
    /// Merge of adjacent partitions.
    Shrink { from: usize, to: usize },
    Unchanged(usize),
}

impl Adjustment {
    pub fn target(&self) -> usize {
        match *self {
            Adjustment::Expand { to, .. } | Adjustment::Shrink { to, .. } => to,
            Adjustment::Unchanged(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionPolicy {
    pub auto: AutoSizing,
}

impl PartitionPolicy {
    pub fn new(auto: AutoSizing) -> Self {
        Self { auto }
    }

    /// Resolves the desired partition count. A hint below 1 counts as 1.
    pub fn resolve_target(&self, current: usize, request: SplitRequest, parallelism_hint: usize) -> usize {
        let target = match request {
            SplitRequest::MinSplits(min) if min > 0 => current.max(min),
            SplitRequest::ExactSplits(exact) if exact > 0 => exact,
            _ => {
                let x1 = self.auto.fraction * parallelism_hint.max(1) as f64;
                let base = x1.ceil();
                if current as f64 <= base {
                    base as usize
                } else {
                    (self.auto.growth * x1).ceil() as usize
                }
            }
        };
        target.max(1)
    }

    /// Picks the transformation without touching any data.
    pub fn plan(&self, current: usize, request: SplitRequest, parallelism_hint: usize) -> Adjustment {
        let target = self.resolve_target(current, request, parallelism_hint);
        if target > current {
            Adjustment::Expand { from: current, to: target }
        } else if target < current {
            Adjustment::Shrink { from: current, to: target }
        } else {
            Adjustment::Unchanged(current)
        }
    }

    /// Reshapes `rows` to the resolved target and returns the target with the
    /// transformed collection.
    pub fn adjust(
        &self,
        rows: PartitionedRows,
        request: SplitRequest,
        parallelism_hint: usize,
    ) -> (usize, PartitionedRows) {
        let blockified = rows.is_blockified();
        let plan = self.plan(rows.num_partitions(), request, parallelism_hint);
        let out = match plan {
            Adjustment::Expand { from, to } => {
                debug!(from, to, blockified, "expanding partitions with a full shuffle");
                rows.shuffle(to)
            }
            Adjustment::Shrink { from, to } => {
                debug!(from, to, blockified, "coalescing adjacent partitions");
                rows.coalesce(to)
            }
            Adjustment::Unchanged(n) => {
                debug!(partitions = n, "partition count already on target");
                rows
            }
        };
        (plan.target(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::IndexedRow;

    fn rows(n: usize, partitions: usize) -> PartitionedRows {
        let rows = (0..n).map(|i| IndexedRow::dense(i, vec![i as f64, 1.0])).collect();
        PartitionedRows::from_rows(2, rows, partitions).unwrap()
    }

    #[test]
    fn min_splits_is_a_lower_bound() {
        let policy = PartitionPolicy::default();
        assert_eq!(policy.resolve_target(3, SplitRequest::MinSplits(8), 4), 8);
        assert_eq!(policy.resolve_target(12, SplitRequest::MinSplits(8), 4), 12);
    }

    #[test]
    fn min_splits_wins_over_exact_splits() {
        let request = SplitRequest::from_counts(16, 4);
        assert_eq!(request, SplitRequest::MinSplits(16));
        assert_eq!(PartitionPolicy::default().resolve_target(10, request, 1), 16);
        assert_eq!(SplitRequest::from_counts(0, 4), SplitRequest::ExactSplits(4));
        assert_eq!(SplitRequest::from_counts(0, 0), SplitRequest::Auto);
    }

    #[test]
    fn exact_splits_sets_the_count() {
        let policy = PartitionPolicy::default();
        assert_eq!(policy.resolve_target(10, SplitRequest::ExactSplits(3), 64), 3);
        assert_eq!(policy.resolve_target(1, SplitRequest::ExactSplits(3), 64), 3);
    }

    #[test]
    fn auto_expands_below_the_hint() {
        let policy = PartitionPolicy::default();
        assert_eq!(policy.resolve_target(10, SplitRequest::Auto, 20), 19);
        assert_eq!(policy.plan(10, SplitRequest::Auto, 20), Adjustment::Expand { from: 10, to: 19 });
    }

    #[test]
    fn auto_doubles_above_the_hint() {
        let policy = PartitionPolicy::default();
        assert_eq!(policy.resolve_target(50, SplitRequest::Auto, 20), 38);
        assert_eq!(policy.plan(50, SplitRequest::Auto, 20), Adjustment::Shrink { from: 50, to: 38 });
    }

    #[test]
    fn auto_clamps_a_zero_hint() {
        let policy = PartitionPolicy::default();
        assert_eq!(policy.resolve_target(1, SplitRequest::Auto, 0), 1);
        assert_eq!(policy.resolve_target(0, SplitRequest::Auto, 0), 1);
        assert_eq!(policy.resolve_target(5, SplitRequest::Auto, 0), 2);
    }

    #[test]
    fn adjust_expands_into_row_wise_partitions() {
        let policy = PartitionPolicy::default();
        let (target, out) = policy.adjust(rows(30, 2).blockify(), SplitRequest::ExactSplits(6), 1);
        assert_eq!(target, 6);
        assert_eq!(out.num_partitions(), 6);
        assert!(!out.is_blockified());
        assert_eq!(out.num_rows(), 30);
    }

    #[test]
    fn adjust_shrinks_blocks_without_unpacking() {
        let policy = PartitionPolicy::default();
        let (target, out) = policy.adjust(rows(30, 10).blockify(), SplitRequest::ExactSplits(4), 1);
        assert_eq!(target, 4);
        assert_eq!(out.num_partitions(), 4);
        assert!(out.is_blockified());
        assert_eq!(out.collect_rows(), rows(30, 1).collect_rows());
    }

    #[test]
    fn adjust_is_idempotent() {
        let policy = PartitionPolicy::default();
        let (first, once) = policy.adjust(rows(40, 50), SplitRequest::Auto, 20);
        let sizes = once.partition_sizes();
        assert_eq!(policy.plan(once.num_partitions(), SplitRequest::Auto, 20), Adjustment::Unchanged(first));
        let (second, twice) = policy.adjust(once, SplitRequest::Auto, 20);
        assert_eq!(first, second);
        assert_eq!(twice.partition_sizes(), sizes);
    }

    #[test]
    fn expand_then_shrink_preserves_rows() {
        let policy = PartitionPolicy::default();
        let original = rows(25, 3);
        let expected = original.collect_rows();
        let (_, wide) = policy.adjust(original, SplitRequest::ExactSplits(9), 1);
        assert_eq!(wide.num_partitions(), 9);
        let (_, narrow) = policy.adjust(wide, SplitRequest::ExactSplits(3), 1);
        assert_eq!(narrow.num_partitions(), 3);
        assert_eq!(narrow.num_rows(), 25);
        assert_eq!(narrow.collect_rows(), expected);
    }
}
