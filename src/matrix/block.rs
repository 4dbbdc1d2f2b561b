//! Blockified partitions: contiguous runs of rows packed into one dense block.
//!
//! A [`RowBlock`] keeps the global row index of every packed row next to a
//! dense `faer` matrix, so conversion back to row-wise records is loss-free and
//! preserves row order. Products against a block go through `faer`'s dense
//! kernels, which is why the blockified path may round differently from the
//! row-by-row path.

use crate::core::dense::{column, first_column};
use crate::matrix::row::IndexedRow;
use faer::Mat;

#[derive(Debug, Clone)]
pub struct RowBlock {
    /// Global row index of each block row, in block order.
    pub row_indices: Vec<usize>,
    /// `row_indices.len() × ncol` dense values.
    pub data: Mat<f64>,
}

impl RowBlock {
    /// An empty block with `ncol` columns.
    pub fn empty(ncol: usize) -> Self {
        Self { row_indices: Vec::new(), data: Mat::zeros(0, ncol) }
    }

    /// Packs rows (in their given order) into a dense block.
    pub fn from_rows(ncol: usize, rows: &[IndexedRow]) -> Self {
        let data = Mat::from_fn(rows.len(), ncol, |i, j| rows[i].vector.get(j));
        Self { row_indices: rows.iter().map(|r| r.index).collect(), data }
    }

    /// Splits the block back into dense row records, in block order.
    pub fn to_rows(&self) -> Vec<IndexedRow> {
        self.row_indices
            .iter()
            .enumerate()
            .map(|(i, &index)| {
                IndexedRow::dense(index, (0..self.data.ncols()).map(|j| self.data[(i, j)]).collect())
            })
            .collect()
    }

    /// Stacks adjacent blocks vertically, keeping their order.
    pub fn concat(ncol: usize, blocks: &[RowBlock]) -> Self {
        let row_indices: Vec<usize> = blocks.iter().flat_map(|b| b.row_indices.iter().copied()).collect();
        let mut owner = Vec::with_capacity(row_indices.len());
        for (k, b) in blocks.iter().enumerate() {
            for i in 0..b.data.nrows() {
                owner.push((k, i));
            }
        }
        let data = Mat::from_fn(owner.len(), ncol, |i, j| {
            let (k, r) = owner[i];
            blocks[k].data[(r, j)]
        });
        Self { row_indices, data }
    }

    pub fn nrows(&self) -> usize {
        self.row_indices.len()
    }

    /// `(row index, block_row · v)` for every packed row.
    pub fn multiply(&self, v: &[f64]) -> Vec<(usize, f64)> {
        if self.nrows() == 0 {
            return Vec::new();
        }
        let y = &self.data * &column(v);
        self.row_indices.iter().copied().zip(first_column(&y)).collect()
    }

    /// This block's share of `Aᵀ (A v)`.
    pub fn times_squared(&self, v: &[f64]) -> Vec<f64> {
        if self.nrows() == 0 {
            return vec![0.0; self.data.ncols()];
        }
        let av = &self.data * &column(v);
        let t = self.data.transpose();
        first_column(&(&t * &av))
    }

    /// This block's share of `Aᵀ b`, reading `b` at the block's global rows.
    pub fn transpose_times(&self, b: &[f64]) -> Vec<f64> {
        if self.nrows() == 0 {
            return vec![0.0; self.data.ncols()];
        }
        let sub: Vec<f64> = self.row_indices.iter().map(|&i| b[i]).collect();
        let t = self.data.transpose();
        first_column(&(&t * &column(&sub)))
    }
}
