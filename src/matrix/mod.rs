//! Matrix module: row records, dense row blocks and the partitioned collection.

pub mod block;
pub mod partitioned;
pub mod row;

pub use block::RowBlock;
pub use partitioned::{Layout, PartitionedRows, Representation};
pub use row::{IndexedRow, RowVector};
