// Scalar types, fields and schemas

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, StringArray,
};
use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};

use crate::error::{Error, Result};

/// The closed set of scalar types a column can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
}

impl ArrowType {
    /// The arrow data type backing columns of this type
    pub fn to_data_type(self) -> DataType {
        match self {
            ArrowType::Boolean => DataType::Boolean,
            ArrowType::Int8 => DataType::Int8,
            ArrowType::Int16 => DataType::Int16,
            ArrowType::Int32 => DataType::Int32,
            ArrowType::Int64 => DataType::Int64,
            ArrowType::Float32 => DataType::Float32,
            ArrowType::Float64 => DataType::Float64,
            ArrowType::Utf8 => DataType::Utf8,
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, ArrowType::Boolean | ArrowType::Utf8)
    }
}

impl TryFrom<&DataType> for ArrowType {
    type Error = Error;

    fn try_from(data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Boolean => Ok(ArrowType::Boolean),
            DataType::Int8 => Ok(ArrowType::Int8),
            DataType::Int16 => Ok(ArrowType::Int16),
            DataType::Int32 => Ok(ArrowType::Int32),
            DataType::Int64 => Ok(ArrowType::Int64),
            DataType::Float32 => Ok(ArrowType::Float32),
            DataType::Float64 => Ok(ArrowType::Float64),
            DataType::Utf8 => Ok(ArrowType::Utf8),
            other => Err(Error::UnsupportedOperation(format!(
                "unsupported data type {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ArrowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArrowType::Boolean => "Boolean",
            ArrowType::Int8 => "Int8",
            ArrowType::Int16 => "Int16",
            ArrowType::Int32 => "Int32",
            ArrowType::Int64 => "Int64",
            ArrowType::Float32 => "Float32",
            ArrowType::Float64 => "Float64",
            ArrowType::Utf8 => "Utf8",
        };
        f.write_str(name)
    }
}

/// A named, typed column of a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    data_type: ArrowType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: ArrowType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> ArrowType {
        self.data_type
    }

    /// Convert to a nullable arrow field
    pub fn to_arrow(&self) -> ArrowField {
        ArrowField::new(self.name.as_str(), self.data_type.to_data_type(), true)
    }
}

impl TryFrom<&ArrowField> for Field {
    type Error = Error;

    fn try_from(field: &ArrowField) -> Result<Self> {
        Ok(Field::new(
            field.name().as_str(),
            ArrowType::try_from(field.data_type())?,
        ))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.data_type)
    }
}

pub type SchemaRef = Arc<Schema>;

/// Ordered collection of fields
///
/// Field names are expected to be unique; lookups return the first match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the field called `name`, if any
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field called `name`, failing with `UnknownColumn` when absent
    pub fn field_with_name(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Sub-schema holding only the named fields, in this schema's order.
    ///
    /// An empty name list selects everything. Names absent from the schema are ignored.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Schema {
        if names.is_empty() {
            return self.clone();
        }
        let fields = self
            .fields
            .iter()
            .filter(|f| names.iter().any(|n| n.as_ref() == f.name))
            .cloned()
            .collect();
        Schema::new(fields)
    }

    pub fn to_arrow(&self) -> Arc<ArrowSchema> {
        Arc::new(ArrowSchema::new(
            self.fields.iter().map(Field::to_arrow).collect::<Vec<_>>(),
        ))
    }
}

impl TryFrom<&ArrowSchema> for Schema {
    type Error = Error;

    fn try_from(schema: &ArrowSchema) -> Result<Self> {
        let fields = schema
            .fields()
            .iter()
            .map(|f| Field::try_from(f.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema::new(fields))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, "]")
    }
}

/// A single non-null value of one of the supported types
///
/// Equality and hashing are structural (floats compare by bit pattern) so values
/// can be used as group keys.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn data_type(&self) -> ArrowType {
        match self {
            ScalarValue::Boolean(_) => ArrowType::Boolean,
            ScalarValue::Int8(_) => ArrowType::Int8,
            ScalarValue::Int16(_) => ArrowType::Int16,
            ScalarValue::Int32(_) => ArrowType::Int32,
            ScalarValue::Int64(_) => ArrowType::Int64,
            ScalarValue::Float32(_) => ArrowType::Float32,
            ScalarValue::Float64(_) => ArrowType::Float64,
            ScalarValue::Utf8(_) => ArrowType::Utf8,
        }
    }

    /// Array repeating this value `len` times
    pub fn to_array(&self, len: usize) -> ArrayRef {
        match self {
            ScalarValue::Boolean(v) => Arc::new(BooleanArray::from(vec![*v; len])),
            ScalarValue::Int8(v) => Arc::new(Int8Array::from(vec![*v; len])),
            ScalarValue::Int16(v) => Arc::new(Int16Array::from(vec![*v; len])),
            ScalarValue::Int32(v) => Arc::new(Int32Array::from(vec![*v; len])),
            ScalarValue::Int64(v) => Arc::new(Int64Array::from(vec![*v; len])),
            ScalarValue::Float32(v) => Arc::new(Float32Array::from(vec![*v; len])),
            ScalarValue::Float64(v) => Arc::new(Float64Array::from(vec![*v; len])),
            ScalarValue::Utf8(v) => Arc::new(StringArray::from(vec![v.as_str(); len])),
        }
    }

    /// Read the value at `index` of an arrow array; `None` for nulls
    pub fn try_from_array(array: &dyn Array, index: usize) -> Result<Option<Self>> {
        if index >= array.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: array.len(),
            });
        }
        if array.is_null(index) {
            return Ok(None);
        }
        let value = match array.data_type() {
            DataType::Boolean => ScalarValue::Boolean(downcast::<BooleanArray>(array)?.value(index)),
            DataType::Int8 => ScalarValue::Int8(downcast::<Int8Array>(array)?.value(index)),
            DataType::Int16 => ScalarValue::Int16(downcast::<Int16Array>(array)?.value(index)),
            DataType::Int32 => ScalarValue::Int32(downcast::<Int32Array>(array)?.value(index)),
            DataType::Int64 => ScalarValue::Int64(downcast::<Int64Array>(array)?.value(index)),
            DataType::Float32 => {
                ScalarValue::Float32(downcast::<Float32Array>(array)?.value(index))
            }
            DataType::Float64 => {
                ScalarValue::Float64(downcast::<Float64Array>(array)?.value(index))
            }
            DataType::Utf8 => {
                ScalarValue::Utf8(downcast::<StringArray>(array)?.value(index).to_string())
            }
            other => {
                return Err(Error::UnsupportedOperation(format!(
                    "no scalar representation for {:?}",
                    other
                )))
            }
        };
        Ok(Some(value))
    }

    /// Build an array of `data_type` from optional values
    pub fn iter_to_array(
        data_type: ArrowType,
        values: impl IntoIterator<Item = Option<ScalarValue>>,
    ) -> Result<ArrayRef> {
        macro_rules! build {
            ($variant:ident, $array:ty) => {{
                let values = values
                    .into_iter()
                    .map(|v| match v {
                        None => Ok(None),
                        Some(ScalarValue::$variant(x)) => Ok(Some(x)),
                        Some(other) => Err(Error::TypeMismatch(format!(
                            "cannot place a {} value in a {} column",
                            other.data_type(),
                            data_type
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(<$array>::from(values)) as ArrayRef
            }};
        }

        Ok(match data_type {
            ArrowType::Boolean => build!(Boolean, BooleanArray),
            ArrowType::Int8 => build!(Int8, Int8Array),
            ArrowType::Int16 => build!(Int16, Int16Array),
            ArrowType::Int32 => build!(Int32, Int32Array),
            ArrowType::Int64 => build!(Int64, Int64Array),
            ArrowType::Float32 => build!(Float32, Float32Array),
            ArrowType::Float64 => build!(Float64, Float64Array),
            ArrowType::Utf8 => build!(Utf8, StringArray),
        })
    }

    /// Same-type addition, failing on integer overflow
    pub fn checked_add(&self, other: &ScalarValue) -> Result<ScalarValue> {
        use ScalarValue::*;
        let overflow = || Error::Overflow(format!("{} + {}", self, other));
        Ok(match (self, other) {
            (Int8(a), Int8(b)) => Int8(a.checked_add(*b).ok_or_else(overflow)?),
            (Int16(a), Int16(b)) => Int16(a.checked_add(*b).ok_or_else(overflow)?),
            (Int32(a), Int32(b)) => Int32(a.checked_add(*b).ok_or_else(overflow)?),
            (Int64(a), Int64(b)) => Int64(a.checked_add(*b).ok_or_else(overflow)?),
            (Float32(a), Float32(b)) => Float32(a + b),
            (Float64(a), Float64(b)) => Float64(a + b),
            _ => {
                return Err(Error::TypeMismatch(format!(
                    "cannot add {} and {}",
                    self.data_type(),
                    other.data_type()
                )))
            }
        })
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int8(v) => Some(*v as f64),
            ScalarValue::Int16(v) => Some(*v as f64),
            ScalarValue::Int32(v) => Some(*v as f64),
            ScalarValue::Int64(v) => Some(*v as f64),
            ScalarValue::Float32(v) => Some(*v as f64),
            ScalarValue::Float64(v) => Some(*v),
            ScalarValue::Boolean(_) | ScalarValue::Utf8(_) => None,
        }
    }
}

fn downcast<T: Array + 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::TypeMismatch(format!(
            "array of type {:?} is not a {}",
            array.data_type(),
            std::any::type_name::<T>()
        ))
    })
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        use ScalarValue::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (Int8(a), Int8(b)) => a == b,
            (Int16(a), Int16(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Float32(a), Float32(b)) => a.to_bits() == b.to_bits(),
            (Float64(a), Float64(b)) => a.to_bits() == b.to_bits(),
            (Utf8(a), Utf8(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ScalarValue::Boolean(v) => v.hash(state),
            ScalarValue::Int8(v) => v.hash(state),
            ScalarValue::Int16(v) => v.hash(state),
            ScalarValue::Int32(v) => v.hash(state),
            ScalarValue::Int64(v) => v.hash(state),
            ScalarValue::Float32(v) => v.to_bits().hash(state),
            ScalarValue::Float64(v) => v.to_bits().hash(state),
            ScalarValue::Utf8(v) => v.hash(state),
        }
    }
}

/// Values of different types are unordered
impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use ScalarValue::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a.partial_cmp(b),
            (Int8(a), Int8(b)) => a.partial_cmp(b),
            (Int16(a), Int16(b)) => a.partial_cmp(b),
            (Int32(a), Int32(b)) => a.partial_cmp(b),
            (Int64(a), Int64(b)) => a.partial_cmp(b),
            (Float32(a), Float32(b)) => Some(a.total_cmp(b)),
            (Float64(a), Float64(b)) => Some(a.total_cmp(b)),
            (Utf8(a), Utf8(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Boolean(v) => write!(f, "{}", v),
            ScalarValue::Int8(v) => write!(f, "{}", v),
            ScalarValue::Int16(v) => write!(f, "{}", v),
            ScalarValue::Int32(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            // Debug keeps the fraction, so 1.0 does not print like the integer 1
            ScalarValue::Float32(v) => write!(f, "{:?}", v),
            ScalarValue::Float64(v) => write!(f, "{:?}", v),
            ScalarValue::Utf8(v) => f.write_str(v),
        }
    }
}
