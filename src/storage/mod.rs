// Data sources feeding scans

pub mod csv_reader;
pub mod memory;
pub mod parquet_reader;

pub use csv_reader::CsvDataSource;
pub use memory::MemoryDataSource;
pub use parquet_reader::ParquetDataSource;

use std::fmt::Debug;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::types::SchemaRef;

/// Contract between scans and the storage they read from
pub trait DataSource: Debug + Send + Sync {
    /// Full schema of the source. Implementations reading files memoize it.
    fn schema(&self) -> Result<SchemaRef>;

    /// Read the named columns (all of them when `projection` is empty).
    ///
    /// Returned batches conform to `schema().select(projection)`.
    fn scan(&self, projection: &[String]) -> Result<Vec<RecordBatch>>;
}

/// Configuration for file-backed data sources
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to read Parquet row groups in parallel (default: true).
    /// CSV files are always read sequentially.
    pub parallel: bool,
    /// Rows per batch (default: 8192)
    pub batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            batch_size: 8192,
        }
    }
}

/// Positions of the projected columns within `schema`, in schema order
fn projection_indices(schema: &crate::types::Schema, projection: &[String]) -> Vec<usize> {
    schema
        .select(projection)
        .fields()
        .iter()
        .filter_map(|f| schema.index_of(f.name()))
        .collect()
}
