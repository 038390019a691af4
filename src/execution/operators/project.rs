// Expression projection

use tracing::trace;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::execution::expressions::PhysicalExpr;
use crate::execution::operators::Operator;
use crate::types::SchemaRef;

/// Project operator that computes one output column per expression
pub struct ProjectOperator {
    exprs: Vec<PhysicalExpr>,
    schema: SchemaRef,
}

impl ProjectOperator {
    /// Create a new Project operator producing `schema`, whose fields line up
    /// with `exprs`
    pub fn new(exprs: Vec<PhysicalExpr>, schema: SchemaRef) -> Self {
        Self { exprs, schema }
    }

    pub fn exprs(&self) -> &[PhysicalExpr] {
        &self.exprs
    }
}

impl Operator for ProjectOperator {
    fn execute(&self, input: &RecordBatch) -> Result<RecordBatch> {
        let columns = self
            .exprs
            .iter()
            .map(|e| e.evaluate(input))
            .collect::<Result<Vec<_>>>()?;
        trace!(rows = input.num_rows(), columns = columns.len(), "projected batch");
        RecordBatch::try_new(self.schema.clone(), columns)
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}
