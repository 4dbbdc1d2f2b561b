// Row-wise records of a distributed matrix

use crate::error::{check_len, DcgError, Result};

/// Values of one matrix row, dense or sparse.
#[derive(Debug, Clone, PartialEq)]
pub enum RowVector {
    Dense(Vec<f64>),
    /// Column indices (strictly increasing) and their values.
    Sparse { indices: Vec<usize>, values: Vec<f64> },
}

impl RowVector {
    /// Builds a sparse row, validating indices against `ncol`.
    pub fn sparse(ncol: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let row = RowVector::Sparse { indices, values };
        row.validate(ncol)?;
        Ok(row)
    }

    /// Checks the row against a matrix width: dense rows must have `ncol`
    /// entries; sparse indices must be strictly increasing and below `ncol`.
    pub fn validate(&self, ncol: usize) -> Result<()> {
        match self {
            RowVector::Dense(values) => check_len("dense row width", ncol, values.len()),
            RowVector::Sparse { indices, values } => {
                check_len("sparse row values", indices.len(), values.len())?;
                if indices.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(DcgError::InvalidInput(
                        "sparse row indices must be strictly increasing".into(),
                    ));
                }
                if let Some(&last) = indices.last() {
                    if last >= ncol {
                        return Err(DcgError::InvalidInput(format!(
                            "sparse row index {last} out of range for {ncol} columns"
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// `row · v`
    pub fn dot(&self, v: &[f64]) -> f64 {
        match self {
            RowVector::Dense(values) => values.iter().zip(v).map(|(a, b)| a * b).sum(),
            RowVector::Sparse { indices, values } => {
                indices.iter().zip(values).map(|(&j, a)| a * v[j]).sum()
            }
        }
    }

    /// Entry at column `j` (zero when absent from a sparse row).
    pub fn get(&self, j: usize) -> f64 {
        match self {
            RowVector::Dense(values) => values.get(j).copied().unwrap_or(0.0),
            RowVector::Sparse { indices, values } => indices
                .binary_search(&j)
                .map(|k| values[k])
                .unwrap_or(0.0),
        }
    }

    /// Adds `scale · row` into `acc`.
    pub fn scatter_add(&self, scale: f64, acc: &mut [f64]) {
        match self {
            RowVector::Dense(values) => {
                for (a, v) in acc.iter_mut().zip(values) {
                    *a += scale * v;
                }
            }
            RowVector::Sparse { indices, values } => {
                for (&j, v) in indices.iter().zip(values) {
                    acc[j] += scale * v;
                }
            }
        }
    }
}

/// One addressable row of the matrix, tagged with its global row index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRow {
    pub index: usize,
    pub vector: RowVector,
}

impl IndexedRow {
    pub fn dense(index: usize, values: Vec<f64>) -> Self {
        Self { index, vector: RowVector::Dense(values) }
    }

    pub fn new(index: usize, vector: RowVector) -> Self {
        Self { index, vector }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_and_dense_agree() {
        let dense = RowVector::Dense(vec![0.0, 2.0, 0.0, -1.0]);
        let sparse = RowVector::sparse(4, vec![1, 3], vec![2.0, -1.0]).unwrap();
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(dense.dot(&v), sparse.dot(&v));
        for j in 0..4 {
            assert_eq!(dense.get(j), sparse.get(j));
        }
    }

    #[test]
    fn sparse_rejects_bad_indices() {
        assert!(RowVector::sparse(3, vec![2, 1], vec![1.0, 1.0]).is_err());
        assert!(RowVector::sparse(3, vec![3], vec![1.0]).is_err());
        assert!(RowVector::sparse(3, vec![0], vec![]).is_err());
        assert!(RowVector::sparse(3, vec![1, 1], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn scatter_add_accumulates() {
        let mut acc = vec![1.0; 3];
        RowVector::sparse(3, vec![0, 2], vec![1.0, 2.0]).unwrap().scatter_add(2.0, &mut acc);
        assert_eq!(acc, vec![3.0, 1.0, 5.0]);
    }
}
