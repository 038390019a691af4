// Batch/vector data structure

use arrow::array::{Array, ArrayRef, BooleanArray, Datum, Scalar, UInt32Array};
use arrow::record_batch::RecordBatch as ArrowRecordBatch;
use arrow_select::concat::concat;
use arrow_select::filter::filter;
use arrow_select::take::take;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ArrowType, Schema, SchemaRef, ScalarValue};

/// A typed column of values
///
/// `Literal` exposes a single value at every index so scalar operands never have
/// to be replicated across a batch.
#[derive(Clone, Debug)]
pub enum ColumnVector {
    Array {
        data_type: ArrowType,
        values: ArrayRef,
    },
    Literal {
        value: ScalarValue,
        len: usize,
    },
}

impl ColumnVector {
    /// Wrap an arrow array, rejecting types the engine does not support
    pub fn try_from_array(values: ArrayRef) -> Result<Self> {
        let data_type = ArrowType::try_from(values.data_type())?;
        Ok(ColumnVector::Array { data_type, values })
    }

    pub fn literal(value: ScalarValue, len: usize) -> Self {
        ColumnVector::Literal { value, len }
    }

    pub fn data_type(&self) -> ArrowType {
        match self {
            ColumnVector::Array { data_type, .. } => *data_type,
            ColumnVector::Literal { value, .. } => value.data_type(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnVector::Array { values, .. } => values.len(),
            ColumnVector::Literal { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, ColumnVector::Literal { .. })
    }

    /// Value at `index`, `None` for nulls. Fails when `index` is out of range.
    pub fn get_value(&self, index: usize) -> Result<Option<ScalarValue>> {
        match self {
            ColumnVector::Array { values, .. } => ScalarValue::try_from_array(values.as_ref(), index),
            ColumnVector::Literal { value, len } => {
                if index >= *len {
                    return Err(Error::IndexOutOfBounds { index, len: *len });
                }
                Ok(Some(value.clone()))
            }
        }
    }

    /// Materialize as an arrow array (literals are expanded to their full length)
    pub fn to_array(&self) -> ArrayRef {
        match self {
            ColumnVector::Array { values, .. } => values.clone(),
            ColumnVector::Literal { value, len } => value.to_array(*len),
        }
    }

    /// Operand for arrow's comparison and arithmetic kernels
    pub fn datum(&self) -> Box<dyn Datum> {
        match self {
            ColumnVector::Array { values, .. } => Box::new(values.clone()),
            ColumnVector::Literal { value, .. } => Box::new(Scalar::new(value.to_array(1))),
        }
    }

    /// Keep the entries whose mask bit is set; null mask entries are dropped
    pub fn filter(&self, mask: &BooleanArray) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(Error::TypeMismatch(format!(
                "mask of length {} applied to column of length {}",
                mask.len(),
                self.len()
            )));
        }
        match self {
            ColumnVector::Array { data_type, values } => Ok(ColumnVector::Array {
                data_type: *data_type,
                values: filter(values.as_ref(), mask)?,
            }),
            ColumnVector::Literal { value, .. } => Ok(ColumnVector::Literal {
                value: value.clone(),
                len: mask.true_count(),
            }),
        }
    }

    /// Reorder (or repeat) entries by position
    pub fn take(&self, indices: &UInt32Array) -> Result<Self> {
        match self {
            ColumnVector::Array { data_type, values } => Ok(ColumnVector::Array {
                data_type: *data_type,
                values: take(values.as_ref(), indices, None)?,
            }),
            ColumnVector::Literal { value, len } => {
                if let Some(index) = indices.values().iter().find(|&&i| i as usize >= *len) {
                    return Err(Error::IndexOutOfBounds {
                        index: *index as usize,
                        len: *len,
                    });
                }
                Ok(ColumnVector::Literal {
                    value: value.clone(),
                    len: indices.len(),
                })
            }
        }
    }
}

/// RecordBatch is a schema plus aligned column vectors, the unit of vectorized execution
#[derive(Clone, Debug)]
pub struct RecordBatch {
    schema: SchemaRef,
    columns: Vec<ColumnVector>,
    num_rows: usize,
}

impl RecordBatch {
    /// Create a new RecordBatch from a schema and columns
    ///
    /// # Errors
    /// Returns an error if the number of columns doesn't match the schema,
    /// if column lengths are inconsistent, or if a column's type differs
    /// from its field's type
    pub fn try_new(schema: SchemaRef, columns: Vec<ColumnVector>) -> Result<Self> {
        if schema.len() != columns.len() {
            return Err(Error::InvalidBatch(format!(
                "Schema has {} fields but {} columns provided",
                schema.len(),
                columns.len()
            )));
        }

        let num_rows = columns.first().map(|col| col.len()).unwrap_or(0);
        for (idx, (col, field)) in columns.iter().zip(schema.fields()).enumerate() {
            if col.len() != num_rows {
                return Err(Error::InvalidBatch(format!(
                    "Column {} has length {} but expected {}",
                    idx,
                    col.len(),
                    num_rows
                )));
            }
            if col.data_type() != field.data_type() {
                return Err(Error::TypeMismatch(format!(
                    "column '{}' declared as {} but holds {}",
                    field.name(),
                    field.data_type(),
                    col.data_type()
                )));
            }
        }

        Ok(Self {
            schema,
            columns,
            num_rows,
        })
    }

    /// Create a new RecordBatch from an ArrowRecordBatch
    pub fn from_arrow(batch: &ArrowRecordBatch) -> Result<Self> {
        let schema = Arc::new(Schema::try_from(batch.schema().as_ref())?);
        let columns = batch
            .columns()
            .iter()
            .map(|col| ColumnVector::try_from_array(col.clone()))
            .collect::<Result<Vec<_>>>()?;
        Self::try_new(schema, columns)
    }

    /// Convert this RecordBatch to an Arrow RecordBatch, expanding literal columns
    pub fn to_arrow(&self) -> Result<ArrowRecordBatch> {
        let columns = self.columns.iter().map(ColumnVector::to_array).collect();
        Ok(ArrowRecordBatch::try_new(self.schema.to_arrow(), columns)?)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnVector] {
        &self.columns
    }

    /// Get a specific column by index
    pub fn column(&self, index: usize) -> Result<&ColumnVector> {
        self.columns.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.columns.len(),
        })
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnVector> {
        let index = self.schema.index_of(name)?;
        self.columns.get(index)
    }

    /// Select a subset of columns by indices
    pub fn select_columns(&self, indices: &[usize]) -> Result<Self> {
        let fields = indices
            .iter()
            .map(|&idx| {
                self.schema
                    .field(idx)
                    .cloned()
                    .ok_or(Error::IndexOutOfBounds {
                        index: idx,
                        len: self.schema.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let columns = indices
            .iter()
            .map(|&idx| self.column(idx).cloned())
            .collect::<Result<Vec<_>>>()?;

        Self::try_new(Arc::new(Schema::new(fields)), columns)
    }

    /// Select a subset of columns by name
    pub fn select_columns_by_name<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                self.schema
                    .index_of(name.as_ref())
                    .ok_or_else(|| Error::UnknownColumn(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.select_columns(&indices)
    }

    /// Apply one mask to every column in lock-step
    pub fn filter(&self, mask: &BooleanArray) -> Result<Self> {
        let columns = self
            .columns
            .iter()
            .map(|col| col.filter(mask))
            .collect::<Result<Vec<_>>>()?;
        let num_rows = mask.true_count();
        if columns.is_empty() {
            // Keep the row count even without columns to carry it
            return Ok(Self {
                schema: self.schema.clone(),
                columns,
                num_rows,
            });
        }
        Self::try_new(self.schema.clone(), columns)
    }

    /// Reorder every column by the same permutation
    pub fn take(&self, indices: &UInt32Array) -> Result<Self> {
        let columns = self
            .columns
            .iter()
            .map(|col| col.take(indices))
            .collect::<Result<Vec<_>>>()?;
        Self::try_new(self.schema.clone(), columns)
    }

    /// Concatenate multiple RecordBatches together
    /// All batches must have the same schema
    pub fn concat(batches: &[Self]) -> Result<Self> {
        let first = batches
            .first()
            .ok_or_else(|| Error::InvalidBatch("Cannot concatenate empty batch list".to_string()))?;

        let first_schema = first.schema();
        for (idx, batch) in batches.iter().enumerate().skip(1) {
            if batch.schema() != first_schema {
                return Err(Error::InvalidBatch(format!(
                    "Batch {} has different schema than first batch",
                    idx
                )));
            }
        }

        let mut concatenated_columns = Vec::with_capacity(first_schema.len());
        for col_idx in 0..first_schema.len() {
            let arrays: Vec<ArrayRef> = batches
                .iter()
                .map(|batch| batch.columns[col_idx].to_array())
                .collect();
            let refs: Vec<&dyn Array> = arrays.iter().map(|a| a.as_ref()).collect();
            concatenated_columns.push(ColumnVector::try_from_array(concat(&refs)?)?);
        }

        Self::try_new(first_schema.clone(), concatenated_columns)
    }

    /// Check if the batch is empty (has zero rows)
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }
}

impl TryFrom<ArrowRecordBatch> for RecordBatch {
    type Error = Error;

    fn try_from(batch: ArrowRecordBatch) -> Result<Self> {
        Self::from_arrow(&batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;
    use arrow::array::{Int64Array, StringArray};

    fn create_test_schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", ArrowType::Int64),
            Field::new("name", ArrowType::Utf8),
            Field::new("active", ArrowType::Boolean),
        ]))
    }

    fn create_test_batch() -> RecordBatch {
        let columns = vec![
            ColumnVector::try_from_array(Arc::new(Int64Array::from(vec![1, 2, 3]))).unwrap(),
            ColumnVector::try_from_array(Arc::new(StringArray::from(vec![
                "Alice", "Bob", "Charlie",
            ])))
            .unwrap(),
            ColumnVector::literal(ScalarValue::Boolean(true), 3),
        ];

        RecordBatch::try_new(create_test_schema(), columns).unwrap()
    }

    #[test]
    fn test_create_batch() {
        let batch = create_test_batch();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 3);
    }

    #[test]
    fn test_column_access() {
        let batch = create_test_batch();

        let col = batch.column(0).unwrap();
        assert_eq!(col.len(), 3);
        assert_eq!(col.get_value(2).unwrap(), Some(ScalarValue::Int64(3)));

        let col = batch.column_by_name("active").unwrap();
        assert!(col.is_literal());
        assert_eq!(col.get_value(1).unwrap(), Some(ScalarValue::Boolean(true)));

        assert!(batch.column(10).is_err());
        assert!(batch.column_by_name("nonexistent").is_none());
    }

    #[test]
    fn test_get_value_is_range_checked() {
        let batch = create_test_batch();
        for col in batch.columns() {
            assert!(matches!(
                col.get_value(3),
                Err(Error::IndexOutOfBounds { index: 3, len: 3 })
            ));
        }
    }

    #[test]
    fn test_select_columns() {
        let batch = create_test_batch();

        let selected = batch.select_columns(&[0, 2]).unwrap();
        assert_eq!(selected.num_columns(), 2);
        assert_eq!(selected.num_rows(), 3);

        let selected = batch.select_columns_by_name(&["name", "id"]).unwrap();
        assert_eq!(selected.schema().fields()[0].name(), "name");
        assert!(batch.select_columns_by_name(&["ghost"]).is_err());
    }

    #[test]
    fn test_filter_keeps_columns_aligned() {
        let batch = create_test_batch();
        let mask = BooleanArray::from(vec![true, false, true]);

        let filtered = batch.filter(&mask).unwrap();
        assert_eq!(filtered.num_rows(), 2);
        let ids: Vec<_> = (0..2)
            .map(|i| filtered.column(0).unwrap().get_value(i).unwrap())
            .collect();
        let names: Vec<_> = (0..2)
            .map(|i| filtered.column(1).unwrap().get_value(i).unwrap())
            .collect();
        assert_eq!(ids, vec![Some(ScalarValue::Int64(1)), Some(ScalarValue::Int64(3))]);
        assert_eq!(
            names,
            vec![
                Some(ScalarValue::Utf8("Alice".into())),
                Some(ScalarValue::Utf8("Charlie".into()))
            ]
        );
        assert_eq!(filtered.column(2).unwrap().len(), 2);
    }

    #[test]
    fn test_filter_treats_null_as_false() {
        let batch = create_test_batch();
        let mask = BooleanArray::from(vec![Some(true), None, Some(false)]);
        assert_eq!(batch.filter(&mask).unwrap().num_rows(), 1);
    }

    #[test]
    fn test_concat() {
        let batch1 = create_test_batch();
        let batch2 = create_test_batch();

        let concatenated = RecordBatch::concat(&[batch1, batch2]).unwrap();
        assert_eq!(concatenated.num_rows(), 6);
        assert_eq!(concatenated.num_columns(), 3);
        assert!(RecordBatch::concat(&[]).is_err());
    }

    #[test]
    fn test_arrow_conversion() {
        let batch = create_test_batch();

        let arrow_batch = batch.to_arrow().unwrap();
        assert_eq!(arrow_batch.num_rows(), 3);
        let batch2 = RecordBatch::from_arrow(&arrow_batch).unwrap();

        assert_eq!(batch.num_rows(), batch2.num_rows());
        assert_eq!(batch.schema(), batch2.schema());
        assert!(!batch2.column(2).unwrap().is_literal());
    }

    #[test]
    fn test_empty_batch() {
        let columns = vec![
            ColumnVector::try_from_array(Arc::new(Int64Array::from(Vec::<i64>::new()))).unwrap(),
            ColumnVector::try_from_array(Arc::new(StringArray::from(Vec::<String>::new())))
                .unwrap(),
            ColumnVector::literal(ScalarValue::Boolean(false), 0),
        ];

        let batch = RecordBatch::try_new(create_test_schema(), columns).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_invalid_batch() {
        let schema = create_test_schema();

        // Wrong number of columns
        let columns = vec![ColumnVector::literal(ScalarValue::Int64(1), 3)];
        assert!(RecordBatch::try_new(schema.clone(), columns).is_err());

        // Inconsistent column lengths
        let columns = vec![
            ColumnVector::literal(ScalarValue::Int64(1), 3),
            ColumnVector::literal(ScalarValue::Utf8("x".into()), 2),
            ColumnVector::literal(ScalarValue::Boolean(true), 3),
        ];
        assert!(matches!(
            RecordBatch::try_new(schema.clone(), columns),
            Err(Error::InvalidBatch(_))
        ));

        // Column type disagrees with its field
        let columns = vec![
            ColumnVector::literal(ScalarValue::Int32(1), 3),
            ColumnVector::literal(ScalarValue::Utf8("x".into()), 3),
            ColumnVector::literal(ScalarValue::Boolean(true), 3),
        ];
        assert!(matches!(
            RecordBatch::try_new(schema, columns),
            Err(Error::TypeMismatch(_))
        ));
    }
}
