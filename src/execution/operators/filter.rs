// Vectorized filtering

use arrow::array::{Array, BooleanArray};
use tracing::trace;

use crate::error::{Error, Result};
use crate::execution::batch::RecordBatch;
use crate::execution::expressions::PhysicalExpr;
use crate::execution::operators::Operator;
use crate::types::{ArrowType, SchemaRef};

/// Filter operator that applies a predicate expression to filter rows
/// Uses vectorized execution with Arrow's compute kernels
pub struct FilterOperator {
    predicate: PhysicalExpr,
    schema: SchemaRef,
}

impl FilterOperator {
    /// Create a new Filter operator
    ///
    /// # Arguments
    /// * `predicate` - Expression evaluating to a Boolean mask
    /// * `input_schema` - Schema of the input data, which is also the output schema
    pub fn new(predicate: PhysicalExpr, input_schema: SchemaRef) -> Self {
        Self {
            predicate,
            schema: input_schema,
        }
    }

    pub fn predicate(&self) -> &PhysicalExpr {
        &self.predicate
    }
}

impl Operator for FilterOperator {
    /// Rows whose mask entry is false or null are dropped
    fn execute(&self, input: &RecordBatch) -> Result<RecordBatch> {
        let mask = self.predicate.evaluate(input)?;
        if mask.data_type() != ArrowType::Boolean {
            return Err(Error::TypeMismatch(format!(
                "filter predicate {} evaluated to {}",
                self.predicate,
                mask.data_type()
            )));
        }
        let mask = mask.to_array();
        let mask = mask
            .as_any()
            .downcast_ref::<BooleanArray>()
            .ok_or_else(|| Error::TypeMismatch("Array is not a boolean array".to_string()))?;

        let output = input.filter(mask)?;
        trace!(rows_in = input.num_rows(), rows_out = output.num_rows(), "filtered batch");
        Ok(output)
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::logical_expr::BooleanOp;
    use crate::test_utils::{employee_batch, employee_schema, values};
    use crate::types::ScalarValue;

    fn filter_by(op: BooleanOp, column: usize, value: ScalarValue) -> FilterOperator {
        FilterOperator::new(
            PhysicalExpr::Boolean {
                op,
                left: Box::new(PhysicalExpr::Column(column)),
                right: Box::new(PhysicalExpr::Literal(value)),
            },
            employee_schema(),
        )
    }

    #[test]
    fn test_filter_keeps_matching_rows() {
        let op = filter_by(BooleanOp::Eq, 1, ScalarValue::Utf8("ES".into()));
        let out = op.execute(&employee_batch()).unwrap();
        assert_eq!(out.num_rows(), 3);
        assert_eq!(
            values(out.column(0).unwrap()),
            vec![
                Some(ScalarValue::Int64(1)),
                Some(ScalarValue::Int64(2)),
                Some(ScalarValue::Int64(4)),
            ]
        );
    }

    #[test]
    fn test_filter_everything_out() {
        let op = filter_by(BooleanOp::Gt, 2, ScalarValue::Int64(1000));
        let out = op.execute(&employee_batch()).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.schema(), &employee_schema());
    }

    #[test]
    fn test_non_boolean_predicate() {
        let op = FilterOperator::new(PhysicalExpr::Column(2), employee_schema());
        assert!(matches!(
            op.execute(&employee_batch()),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_literal_predicate() {
        let op = FilterOperator::new(
            PhysicalExpr::Literal(ScalarValue::Boolean(true)),
            employee_schema(),
        );
        assert_eq!(op.execute(&employee_batch()).unwrap().num_rows(), 4);
    }
}
