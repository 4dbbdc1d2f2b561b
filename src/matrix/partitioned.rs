//! Row-partitioned matrix storage.
//!
//! A [`PartitionedRows`] is the physical form of a distributed matrix: a list
//! of partitions, each holding either individual row records (row-wise) or one
//! packed dense block (blockified). The two layouts convert into each other
//! without loss and keep row order within a partition.
//!
//! Repartitioning comes in two flavours:
//! - [`PartitionedRows::shuffle`]: every row may move to any partition. Used to
//!   grow the partition count; always produces a row-wise layout.
//! - [`PartitionedRows::coalesce`]: merges adjacent partitions, no row leaves
//!   its neighbourhood. Used to shrink; keeps the current layout.
//!
//! The products (`multiply`, `times_squared`, `transpose_times`, `diagonal`)
//! run partition-locally through an [`ExecutionEngine`] and are reduced in
//! partition order.

use std::collections::HashSet;

use crate::error::{check_len, DcgError, Result};
use crate::matrix::block::RowBlock;
use crate::matrix::row::{IndexedRow, RowVector};
use crate::parallel::ExecutionEngine;

/// Physical encoding of the partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    RowWise,
    Blockified { ncol: usize },
}

#[derive(Debug, Clone)]
pub enum Layout {
    RowWise(Vec<Vec<IndexedRow>>),
    Blockified(Vec<RowBlock>),
}

#[derive(Debug, Clone)]
pub struct PartitionedRows {
    ncol: usize,
    layout: Layout,
}

impl PartitionedRows {
    /// Wraps row-wise partitions after checking every row against `ncol`
    /// (see [`RowVector::validate`]) and row-index uniqueness.
    pub fn row_wise(ncol: usize, partitions: Vec<Vec<IndexedRow>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for row in partitions.iter().flatten() {
            if !seen.insert(row.index) {
                return Err(DcgError::InvalidInput(format!("duplicate row index {}", row.index)));
            }
            row.vector.validate(ncol)?;
        }
        Ok(Self { ncol, layout: Layout::RowWise(partitions) })
    }

    /// Splits `rows` into `partitions` contiguous runs of near-equal size.
    pub fn from_rows(ncol: usize, rows: Vec<IndexedRow>, partitions: usize) -> Result<Self> {
        let partitions = partitions.max(1);
        let total = rows.len();
        let mut parts: Vec<Vec<IndexedRow>> = (0..partitions).map(|_| Vec::new()).collect();
        for (k, row) in rows.into_iter().enumerate() {
            parts[k * partitions / total.max(1)].push(row);
        }
        Self::row_wise(ncol, parts)
    }

    /// A collection with no partitions.
    pub fn empty(ncol: usize) -> Self {
        Self { ncol, layout: Layout::RowWise(Vec::new()) }
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn num_partitions(&self) -> usize {
        match &self.layout {
            Layout::RowWise(parts) => parts.len(),
            Layout::Blockified(blocks) => blocks.len(),
        }
    }

    pub fn num_rows(&self) -> usize {
        match &self.layout {
            Layout::RowWise(parts) => parts.iter().map(Vec::len).sum(),
            Layout::Blockified(blocks) => blocks.iter().map(RowBlock::nrows).sum(),
        }
    }

    /// Row count of each partition, in partition order.
    pub fn partition_sizes(&self) -> Vec<usize> {
        match &self.layout {
            Layout::RowWise(parts) => parts.iter().map(Vec::len).collect(),
            Layout::Blockified(blocks) => blocks.iter().map(RowBlock::nrows).collect(),
        }
    }

    pub fn representation(&self) -> Representation {
        match self.layout {
            Layout::RowWise(_) => Representation::RowWise,
            Layout::Blockified(_) => Representation::Blockified { ncol: self.ncol },
        }
    }

    pub fn is_blockified(&self) -> bool {
        matches!(self.layout, Layout::Blockified(_))
    }

    /// Largest row index present, if any.
    pub fn max_row_index(&self) -> Option<usize> {
        match &self.layout {
            Layout::RowWise(parts) => parts.iter().flatten().map(|r| r.index).max(),
            Layout::Blockified(blocks) => blocks.iter().flat_map(|b| b.row_indices.iter().copied()).max(),
        }
    }

    /// Packs every partition into a single dense block.
    pub fn blockify(self) -> Self {
        let ncol = self.ncol;
        match self.layout {
            Layout::Blockified(_) => self,
            Layout::RowWise(parts) => Self {
                ncol,
                layout: Layout::Blockified(parts.iter().map(|rows| RowBlock::from_rows(ncol, rows)).collect()),
            },
        }
    }

    /// Splits every block back into row records.
    pub fn to_row_wise(self) -> Self {
        let ncol = self.ncol;
        match self.layout {
            Layout::RowWise(_) => self,
            Layout::Blockified(blocks) => Self {
                ncol,
                layout: Layout::RowWise(blocks.iter().map(RowBlock::to_rows).collect()),
            },
        }
    }

    /// All rows, sorted by row index, in row-wise form.
    pub fn collect_rows(&self) -> Vec<IndexedRow> {
        let mut rows: Vec<IndexedRow> = match &self.layout {
            Layout::RowWise(parts) => parts.iter().flatten().cloned().collect(),
            Layout::Blockified(blocks) => blocks.iter().flat_map(RowBlock::to_rows).collect(),
        };
        rows.sort_by_key(|r| r.index);
        rows
    }

    /// Full redistribution into `target` partitions.
    ///
    /// Rows of source partition `p` are dealt round-robin starting at
    /// partition `p % target`, so every row may land anywhere. Blocks are
    /// decomposed first; the result is always row-wise.
    pub fn shuffle(self, target: usize) -> Self {
        let target = target.max(1);
        let ncol = self.ncol;
        let parts = match self.layout {
            Layout::RowWise(parts) => parts,
            Layout::Blockified(blocks) => blocks.iter().map(RowBlock::to_rows).collect(),
        };
        let mut out: Vec<Vec<IndexedRow>> = (0..target).map(|_| Vec::new()).collect();
        for (p, rows) in parts.into_iter().enumerate() {
            let start = p % target;
            for (k, row) in rows.into_iter().enumerate() {
                out[(start + k) % target].push(row);
            }
        }
        Self { ncol, layout: Layout::RowWise(out) }
    }

    /// Merges adjacent partitions down to `target`, keeping the layout.
    ///
    /// New partition `i` takes source partitions
    /// `[i * n / target, (i + 1) * n / target)`. A target at or above the
    /// current count leaves the collection unchanged.
    pub fn coalesce(self, target: usize) -> Self {
        let current = self.num_partitions();
        let target = target.max(1);
        if target >= current {
            return self;
        }
        let ncol = self.ncol;
        let ranges: Vec<(usize, usize)> =
            (0..target).map(|i| (i * current / target, (i + 1) * current / target)).collect();
        let layout = match self.layout {
            Layout::RowWise(parts) => {
                let mut parts = parts.into_iter();
                Layout::RowWise(
                    ranges
                        .iter()
                        .map(|&(lo, hi)| parts.by_ref().take(hi - lo).flatten().collect())
                        .collect(),
                )
            }
            Layout::Blockified(blocks) => Layout::Blockified(
                ranges.iter().map(|&(lo, hi)| RowBlock::concat(ncol, &blocks[lo..hi])).collect(),
            ),
        };
        Self { ncol, layout }
    }

    /// `A · v` laid out over `nrows` positions. Rows absent from the
    /// collection contribute zeros.
    pub fn multiply<E: ExecutionEngine>(&self, engine: &E, v: &[f64], nrows: usize) -> Result<Vec<f64>> {
        check_len("multiply operand", self.ncol, v.len())?;
        let pieces: Vec<Vec<(usize, f64)>> = match &self.layout {
            Layout::RowWise(parts) => engine.map_partitions(parts, |_, rows: &Vec<IndexedRow>| {
                rows.iter().map(|r| (r.index, r.vector.dot(v))).collect()
            }),
            Layout::Blockified(blocks) => engine.map_partitions(blocks, |_, block: &RowBlock| block.multiply(v)),
        };
        let mut y = vec![0.0; nrows];
        for (index, value) in pieces.into_iter().flatten() {
            match y.get_mut(index) {
                Some(slot) => *slot = value,
                None => {
                    return Err(DcgError::DimensionMismatch {
                        context: "row index within product length",
                        expected: nrows,
                        found: index + 1,
                    });
                }
            }
        }
        Ok(y)
    }

    /// `Aᵀ (A v)`, accumulated as Σ (row · v) row.
    pub fn times_squared<E: ExecutionEngine>(&self, engine: &E, v: &[f64]) -> Result<Vec<f64>> {
        check_len("times-squared operand", self.ncol, v.len())?;
        let ncol = self.ncol;
        let partials = match &self.layout {
            Layout::RowWise(parts) => engine.map_partitions(parts, |_, rows: &Vec<IndexedRow>| {
                let mut acc = vec![0.0; ncol];
                for row in rows {
                    row.vector.scatter_add(row.vector.dot(v), &mut acc);
                }
                acc
            }),
            Layout::Blockified(blocks) => engine.map_partitions(blocks, |_, block: &RowBlock| block.times_squared(v)),
        };
        Ok(sum_partials(ncol, partials))
    }

    /// `Aᵀ b`, where `b` is indexed by global row.
    pub fn transpose_times<E: ExecutionEngine>(&self, engine: &E, b: &[f64]) -> Result<Vec<f64>> {
        if let Some(max) = self.max_row_index() {
            if max >= b.len() {
                return Err(DcgError::DimensionMismatch {
                    context: "transpose-times operand",
                    expected: max + 1,
                    found: b.len(),
                });
            }
        }
        let ncol = self.ncol;
        let partials = match &self.layout {
            Layout::RowWise(parts) => engine.map_partitions(parts, |_, rows: &Vec<IndexedRow>| {
                let mut acc = vec![0.0; ncol];
                for row in rows {
                    row.vector.scatter_add(b[row.index], &mut acc);
                }
                acc
            }),
            Layout::Blockified(blocks) => engine.map_partitions(blocks, |_, block: &RowBlock| block.transpose_times(b)),
        };
        Ok(sum_partials(ncol, partials))
    }

    /// Main diagonal `A[i][i]` for `i < n`.
    pub fn diagonal<E: ExecutionEngine>(&self, engine: &E, n: usize) -> Vec<f64> {
        let pieces: Vec<Vec<(usize, f64)>> = match &self.layout {
            Layout::RowWise(parts) => engine.map_partitions(parts, |_, rows: &Vec<IndexedRow>| {
                rows.iter().map(|r| (r.index, r.vector.get(r.index))).collect()
            }),
            Layout::Blockified(blocks) => engine.map_partitions(blocks, |_, block: &RowBlock| {
                block
                    .row_indices
                    .iter()
                    .enumerate()
                    .filter(|&(_, &idx)| idx < block.data.ncols())
                    .map(|(i, &idx)| (idx, block.data[(i, idx)]))
                    .collect()
            }),
        };
        let mut diag = vec![0.0; n];
        for (index, value) in pieces.into_iter().flatten() {
            if let Some(slot) = diag.get_mut(index) {
                *slot = value;
            }
        }
        diag
    }

    /// Column-wise sums of squares, i.e. the diagonal of `AᵀA`.
    pub fn column_squares<E: ExecutionEngine>(&self, engine: &E) -> Vec<f64> {
        let ncol = self.ncol;
        let partials = match &self.layout {
            Layout::RowWise(parts) => engine.map_partitions(parts, |_, rows: &Vec<IndexedRow>| {
                let mut acc = vec![0.0; ncol];
                for row in rows {
                    match &row.vector {
                        RowVector::Dense(values) => {
                            for (a, v) in acc.iter_mut().zip(values) {
                                *a += v * v;
                            }
                        }
                        RowVector::Sparse { indices, values } => {
                            for (&j, v) in indices.iter().zip(values) {
                                acc[j] += v * v;
                            }
                        }
                    }
                }
                acc
            }),
            Layout::Blockified(blocks) => engine.map_partitions(blocks, |_, block: &RowBlock| {
                (0..ncol)
                    .map(|j| (0..block.data.nrows()).map(|i| block.data[(i, j)].powi(2)).sum::<f64>())
                    .collect::<Vec<f64>>()
            }),
        };
        sum_partials(ncol, partials)
    }
}

fn sum_partials(len: usize, partials: Vec<Vec<f64>>) -> Vec<f64> {
    let mut acc = vec![0.0; len];
    for part in partials {
        for (a, p) in acc.iter_mut().zip(part) {
            *a += p;
        }
    }
    acc
}
