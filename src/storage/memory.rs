// In-process store for matrices and vector records

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{DcgError, Result};
use crate::matrix::{IndexedRow, PartitionedRows};
use crate::storage::{MatrixStore, ScratchSpace, VectorStore};

#[derive(Debug, Clone)]
enum Entry {
    Matrix { ncol: usize, partitions: Vec<Vec<IndexedRow>> },
    Vectors(Vec<(usize, Vec<f64>)>),
}

/// Locations are plain strings; `remove` drops a location and every location
/// nested under it (`"tmp"` also removes `"tmp/times-0"`).
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| DcgError::Storage("memory store lock poisoned".into()))
    }

    /// Stores a row-partitioned matrix.
    pub fn put_matrix(&self, location: &str, ncol: usize, partitions: Vec<Vec<IndexedRow>>) -> Result<()> {
        // validate once on the way in
        PartitionedRows::row_wise(ncol, partitions.clone())?;
        self.lock()?.insert(location.to_string(), Entry::Matrix { ncol, partitions });
        Ok(())
    }

    /// Stores raw vector records, possibly none.
    pub fn put_vectors(&self, location: &str, records: Vec<(usize, Vec<f64>)>) -> Result<()> {
        self.lock()?.insert(location.to_string(), Entry::Vectors(records));
        Ok(())
    }

    pub fn contains(&self, location: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(location))
    }

    /// All records at `location`, in insertion order.
    pub fn vector_records(&self, location: &str) -> Result<Vec<(usize, Vec<f64>)>> {
        match self.lock()?.get(location) {
            Some(Entry::Vectors(records)) => Ok(records.clone()),
            Some(Entry::Matrix { .. }) => Err(DcgError::Storage(format!("`{location}` holds a matrix, not vectors"))),
            None => Err(DcgError::Storage(format!("no data at `{location}`"))),
        }
    }
}

impl MatrixStore for MemoryStore {
    fn load_matrix(&self, location: &str, ncol: usize) -> Result<PartitionedRows> {
        let guard = self.lock()?;
        match guard.get(location) {
            Some(Entry::Matrix { ncol: stored, partitions }) => {
                if *stored != ncol {
                    return Err(DcgError::DimensionMismatch {
                        context: "stored matrix columns",
                        expected: ncol,
                        found: *stored,
                    });
                }
                PartitionedRows::row_wise(ncol, partitions.clone())
            }
            Some(Entry::Vectors(_)) => Err(DcgError::Storage(format!("`{location}` holds vectors, not a matrix"))),
            None => Err(DcgError::Storage(format!("no data at `{location}`"))),
        }
    }
}

impl VectorStore for MemoryStore {
    fn load_vector(&self, location: &str) -> Result<Vec<f64>> {
        self.vector_records(location)?
            .into_iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| DcgError::EmptyVector(location.to_string()))
    }

    fn save_vector(&self, location: &str, label: usize, vector: &[f64]) -> Result<()> {
        self.put_vectors(location, vec![(label, vector.to_vec())])
    }
}

impl ScratchSpace for MemoryStore {
    fn remove(&self, location: &str) -> Result<()> {
        let nested = format!("{}/", location.trim_end_matches('/'));
        self.lock()?
            .retain(|key, _| key != location && !key.starts_with(&nested));
        Ok(())
    }
}
