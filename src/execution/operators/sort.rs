// ORDER BY sorting

use arrow::array::{Array, UInt32Array};
use arrow::row::{RowConverter, SortField};
use arrow_ord::sort::SortOptions;
use tracing::debug;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::execution::operators::Operator;
use crate::types::SchemaRef;

/// Sort key: input column position and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub ascending: bool,
}

/// Sort operator for ORDER BY
///
/// Rows comparing equal on every key keep their input order.
pub struct SortOperator {
    keys: Vec<SortKey>,
    schema: SchemaRef,
}

impl SortOperator {
    pub fn new(keys: Vec<SortKey>, input_schema: SchemaRef) -> Self {
        Self {
            keys,
            schema: input_schema,
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Sort a single batch
    fn sort_batch(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        if batch.num_rows() == 0 || self.keys.is_empty() {
            return Ok(batch.clone());
        }

        let mut fields = Vec::with_capacity(self.keys.len());
        let mut arrays = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let column = batch.column(key.column)?.to_array();
            fields.push(SortField::new_with_options(
                column.data_type().clone(),
                SortOptions {
                    descending: !key.ascending,
                    nulls_first: true,
                },
            ));
            arrays.push(column);
        }

        // Row encoding compares all keys at once; sort_by keeps ties in input order
        let rows = RowConverter::new(fields)?.convert_columns(&arrays)?;
        let mut indices: Vec<u32> = (0..batch.num_rows() as u32).collect();
        indices.sort_by(|&a, &b| rows.row(a as usize).cmp(&rows.row(b as usize)));

        batch.take(&UInt32Array::from(indices))
    }
}

impl Operator for SortOperator {
    fn execute(&self, input: &RecordBatch) -> Result<RecordBatch> {
        self.sort_batch(input)
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn execute_many(&self, inputs: &[RecordBatch]) -> Result<Vec<RecordBatch>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        // Concat all batches then sort (for correct global ORDER BY)
        let combined = RecordBatch::concat(inputs)?;
        let sorted = self.sort_batch(&combined)?;
        debug!(rows = sorted.num_rows(), batches = inputs.len(), "sort complete");
        Ok(if sorted.is_empty() { vec![] } else { vec![sorted] })
    }
}
