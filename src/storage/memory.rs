// In-memory data source

use tracing::debug;

use crate::error::{Error, Result};
use crate::execution::batch::RecordBatch;
use crate::storage::DataSource;
use crate::types::SchemaRef;

/// Data source over batches already held in memory
#[derive(Debug, Clone)]
pub struct MemoryDataSource {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl MemoryDataSource {
    /// Every batch must carry exactly `schema`
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        if let Some(idx) = batches.iter().position(|b| b.schema() != &schema) {
            return Err(Error::InvalidBatch(format!(
                "Batch {} does not match the data source schema",
                idx
            )));
        }
        Ok(Self { schema, batches })
    }
}

impl DataSource for MemoryDataSource {
    fn schema(&self) -> Result<SchemaRef> {
        Ok(self.schema.clone())
    }

    fn scan(&self, projection: &[String]) -> Result<Vec<RecordBatch>> {
        let projected = self.schema.select(projection);
        let names: Vec<&str> = projected.fields().iter().map(|f| f.name()).collect();
        debug!(batches = self.batches.len(), columns = ?names, "scanning memory source");
        self.batches
            .iter()
            .map(|batch| batch.select_columns_by_name(&names))
            .collect()
    }
}
