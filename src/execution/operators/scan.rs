// Scan data sources

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::storage::DataSource;
use crate::types::SchemaRef;

/// Scan operator that reads the projected columns of a data source
pub struct ScanOperator {
    path: String,
    source: Arc<dyn DataSource>,
    projection: Vec<String>,
    schema: SchemaRef,
}

impl ScanOperator {
    /// Create a new Scan operator
    ///
    /// # Arguments
    /// * `path` - Name the source was registered under, used when rendering
    /// * `source` - Data source to read from
    /// * `projection` - Column names to read; empty reads every column
    pub fn try_new(
        path: impl Into<String>,
        source: Arc<dyn DataSource>,
        projection: Vec<String>,
    ) -> Result<Self> {
        let schema = Arc::new(source.schema()?.select(&projection));
        Ok(Self {
            path: path.into(),
            source,
            projection,
            schema,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Source schema narrowed to the projection
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Read all data from the source
    ///
    /// Scans are leaves, so they read from storage instead of transforming
    /// input batches like the other operators.
    pub fn read_all(&self) -> Result<Vec<RecordBatch>> {
        let batches = self.source.scan(&self.projection)?;
        debug!(path = %self.path, batches = batches.len(), "scan complete");
        Ok(batches)
    }
}
