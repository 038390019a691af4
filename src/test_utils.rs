// Shared fixtures for unit tests

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};

use crate::execution::batch::{ColumnVector, RecordBatch};
use crate::planner::logical_plan::LogicalPlan;
use crate::storage::{DataSource, MemoryDataSource};
use crate::types::{ArrowType, Field, Schema, SchemaRef, ScalarValue};

pub fn employee_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", ArrowType::Int64),
        Field::new("country", ArrowType::Utf8),
        Field::new("salary", ArrowType::Int64),
    ]))
}

/// Four employees: (1, ES, 100), (2, ES, 200), (3, FR, 50), (4, ES, 300)
pub fn employee_batch() -> RecordBatch {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
        Arc::new(StringArray::from(vec!["ES", "ES", "FR", "ES"])),
        Arc::new(Int64Array::from(vec![100, 200, 50, 300])),
    ];
    let columns = columns
        .into_iter()
        .map(|c| ColumnVector::try_from_array(c).unwrap())
        .collect();
    RecordBatch::try_new(employee_schema(), columns).unwrap()
}

pub fn employee_source() -> Arc<dyn DataSource> {
    Arc::new(MemoryDataSource::try_new(employee_schema(), vec![employee_batch()]).unwrap())
}

/// Scan of every employee column, registered as `employee`
pub fn employee_scan() -> LogicalPlan {
    LogicalPlan::scan("employee", employee_source(), vec![]).unwrap()
}

pub fn field_names(schema: &Schema) -> Vec<&str> {
    schema.fields().iter().map(|f| f.name()).collect()
}

/// Every value of a column, nulls as `None`
pub fn values(column: &ColumnVector) -> Vec<Option<ScalarValue>> {
    (0..column.len())
        .map(|i| column.get_value(i).unwrap())
        .collect()
}

/// Values of the named column across all batches
pub fn column_values(batches: &[RecordBatch], name: &str) -> Vec<Option<ScalarValue>> {
    batches
        .iter()
        .flat_map(|b| values(b.column_by_name(name).unwrap()))
        .collect()
}
