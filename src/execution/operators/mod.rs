pub mod aggregate;
pub mod filter;
pub mod project;
pub mod scan;
pub mod sort;

// Export operators for use by the physical plan
pub use aggregate::HashAggregateOperator;
pub use filter::FilterOperator;
pub use project::ProjectOperator;
pub use scan::ScanOperator;
pub use sort::{SortKey, SortOperator};

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::types::SchemaRef;

/// Lazily produced sequence of batches
pub type BatchStream<'a> = Box<dyn Iterator<Item = Result<RecordBatch>> + Send + 'a>;

/// Trait for all execution operators in the query engine
/// Operators process RecordBatches in a vectorized manner
pub trait Operator: Send + Sync {
    /// Execute the operator on a batch of data
    ///
    /// # Arguments
    /// * `input` - Input RecordBatch to process
    ///
    /// # Returns
    /// Result containing the output RecordBatch
    fn execute(&self, input: &RecordBatch) -> Result<RecordBatch>;

    /// Get the output schema of this operator
    fn schema(&self) -> SchemaRef;

    /// Execute the operator on multiple batches
    /// Default implementation processes each batch individually; blocking
    /// operators override it to see their whole input at once
    fn execute_many(&self, inputs: &[RecordBatch]) -> Result<Vec<RecordBatch>> {
        inputs.iter().map(|batch| self.execute(batch)).collect()
    }
}
