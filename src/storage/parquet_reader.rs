// Parquet file reading

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use arrow::record_batch::RecordBatch as ArrowRecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::storage::{projection_indices, DataSource, ScanConfig};
use crate::types::{Schema, SchemaRef};

/// Parquet reader that reads files into Arrow RecordBatches
pub struct ParquetReader {
    file_path: PathBuf,
    config: ScanConfig,
    /// Root column indices to read; `None` reads every column
    column_indices: Option<Vec<usize>>,
}

impl ParquetReader {
    pub fn new<P: AsRef<Path>>(
        path: P,
        config: ScanConfig,
        column_indices: Option<Vec<usize>>,
    ) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            config,
            column_indices,
        }
    }

    /// Read the arrow schema stored in the file footer
    pub fn schema(&self) -> Result<Schema> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.file_path)?)?;
        Schema::try_from(builder.schema().as_ref())
    }

    /// Read all data from the Parquet file into RecordBatches
    /// If parallel is enabled, reads row groups in parallel
    pub fn read_all(&self) -> Result<Vec<ArrowRecordBatch>> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.file_path)?)?;
        let num_row_groups = builder.metadata().num_row_groups();

        if num_row_groups == 0 {
            return Ok(Vec::new());
        }

        let per_group: Vec<Vec<ArrowRecordBatch>> = if self.config.parallel && num_row_groups > 1 {
            (0..num_row_groups)
                .into_par_iter()
                .map(|i| self.read_row_group(i))
                .collect::<Result<_>>()?
        } else {
            (0..num_row_groups)
                .map(|i| self.read_row_group(i))
                .collect::<Result<_>>()?
        };

        Ok(per_group.into_iter().flatten().collect())
    }

    /// Read a specific row group
    ///
    /// Each call opens its own file handle so row groups can be read concurrently.
    pub fn read_row_group(&self, row_group_index: usize) -> Result<Vec<ArrowRecordBatch>> {
        let mut builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.file_path)?)?
            .with_row_groups(vec![row_group_index])
            .with_batch_size(self.config.batch_size);

        // Apply column pruning if specified
        if let Some(ref column_indices) = self.column_indices {
            let mask = ProjectionMask::roots(builder.parquet_schema(), column_indices.iter().copied());
            builder = builder.with_projection(mask);
        }

        let mut batches = Vec::new();
        for batch in builder.build()? {
            batches.push(batch?);
        }
        Ok(batches)
    }
}

/// Data source over a single Parquet file
#[derive(Debug)]
pub struct ParquetDataSource {
    path: PathBuf,
    config: ScanConfig,
    schema: OnceLock<SchemaRef>,
}

impl ParquetDataSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_config(path, ScanConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: ScanConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            schema: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for ParquetDataSource {
    fn schema(&self) -> Result<SchemaRef> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema.clone());
        }
        let schema = Arc::new(ParquetReader::new(&self.path, self.config.clone(), None).schema()?);
        Ok(self.schema.get_or_init(|| schema).clone())
    }

    fn scan(&self, projection: &[String]) -> Result<Vec<RecordBatch>> {
        let schema = self.schema()?;
        let column_indices =
            (!projection.is_empty()).then(|| projection_indices(&schema, projection));

        let reader = ParquetReader::new(&self.path, self.config.clone(), column_indices);
        let batches = reader
            .read_all()?
            .iter()
            .map(RecordBatch::from_arrow)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            path = %self.path.display(),
            batches = batches.len(),
            rows = batches.iter().map(|b| b.num_rows()).sum::<usize>(),
            "read parquet file"
        );
        Ok(batches)
    }
}
