// GROUP BY aggregations

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::execution::accumulator::Accumulator;
use crate::execution::batch::{ColumnVector, RecordBatch};
use crate::execution::expressions::{PhysicalAggregateExpr, PhysicalExpr};
use crate::execution::operators::Operator;
use crate::types::{ScalarValue, SchemaRef};

/// Group key: one value per grouping expression, nulls forming their own group
type GroupKey = Vec<Option<ScalarValue>>;

/// Aggregate operator implementing GROUP BY with COUNT, SUM, AVG, MIN, MAX
///
/// Builds a hash map of group key -> accumulators over its whole input and
/// emits a single batch with the aggregate columns followed by the group
/// columns. Groups appear in the order they were first seen.
pub struct HashAggregateOperator {
    group_exprs: Vec<PhysicalExpr>,
    aggregate_exprs: Vec<PhysicalAggregateExpr>,
    schema: SchemaRef,
}

/// Groups collected so far, in first-seen order
#[derive(Default)]
struct GroupTable {
    index: HashMap<GroupKey, usize>,
    keys: Vec<GroupKey>,
    accumulators: Vec<Vec<Box<dyn Accumulator>>>,
}

impl HashAggregateOperator {
    pub fn new(
        group_exprs: Vec<PhysicalExpr>,
        aggregate_exprs: Vec<PhysicalAggregateExpr>,
        schema: SchemaRef,
    ) -> Self {
        Self {
            group_exprs,
            aggregate_exprs,
            schema,
        }
    }

    pub fn group_exprs(&self) -> &[PhysicalExpr] {
        &self.group_exprs
    }

    pub fn aggregate_exprs(&self) -> &[PhysicalAggregateExpr] {
        &self.aggregate_exprs
    }

    /// Fold every row of `batch` into `table`
    fn accumulate_batch(&self, table: &mut GroupTable, batch: &RecordBatch) -> Result<()> {
        let group_columns = self
            .group_exprs
            .iter()
            .map(|e| e.evaluate(batch))
            .collect::<Result<Vec<_>>>()?;
        let aggregate_inputs = self
            .aggregate_exprs
            .iter()
            .map(|a| a.input.evaluate(batch))
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let key = group_columns
                .iter()
                .map(|c| c.get_value(row))
                .collect::<Result<GroupKey>>()?;

            let slot = match table.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    let slot = table.keys.len();
                    table.index.insert(key.clone(), slot);
                    table.keys.push(key);
                    table.accumulators.push(
                        self.aggregate_exprs
                            .iter()
                            .map(PhysicalAggregateExpr::create_accumulator)
                            .collect(),
                    );
                    slot
                }
            };

            for (acc, input) in table.accumulators[slot].iter_mut().zip(&aggregate_inputs) {
                acc.accumulate(input.get_value(row)?)?;
            }
        }
        Ok(())
    }

    /// Aggregate all `inputs`; `None` when no group was seen
    fn aggregate(&self, inputs: &[RecordBatch]) -> Result<Option<RecordBatch>> {
        let expected = self.group_exprs.len() + self.aggregate_exprs.len();
        if self.schema.len() != expected {
            return Err(Error::InvalidBatch(format!(
                "aggregate schema has {} fields for {} expressions",
                self.schema.len(),
                expected
            )));
        }

        let mut table = GroupTable::default();
        for batch in inputs {
            self.accumulate_batch(&mut table, batch)?;
        }
        if table.keys.is_empty() {
            return Ok(None);
        }

        let num_aggregates = self.aggregate_exprs.len();
        let mut columns = Vec::with_capacity(self.schema.len());
        for (i, field) in self.schema.fields().iter().enumerate() {
            let values: Vec<Option<ScalarValue>> = if i < num_aggregates {
                table
                    .accumulators
                    .iter()
                    .map(|accs| accs[i].final_value())
                    .collect()
            } else {
                let g = i - num_aggregates;
                table.keys.iter().map(|key| key[g].clone()).collect()
            };
            let array = ScalarValue::iter_to_array(field.data_type(), values)?;
            columns.push(ColumnVector::try_from_array(array)?);
        }

        debug!(
            groups = table.keys.len(),
            batches = inputs.len(),
            "hash aggregate complete"
        );
        RecordBatch::try_new(self.schema.clone(), columns).map(Some)
    }
}

impl Operator for HashAggregateOperator {
    /// Aggregates one batch; fails unless it yields exactly one output batch
    fn execute(&self, input: &RecordBatch) -> Result<RecordBatch> {
        let mut batches = self.execute_many(std::slice::from_ref(input))?;
        match batches.len() {
            1 => Ok(batches.remove(0)),
            n => Err(Error::InvalidBatch(format!(
                "aggregate produced {} batches from one input batch",
                n
            ))),
        }
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Aggregates across all inputs at once; emits nothing when the input has no rows
    fn execute_many(&self, inputs: &[RecordBatch]) -> Result<Vec<RecordBatch>> {
        Ok(self.aggregate(inputs)?.into_iter().collect())
    }
}
