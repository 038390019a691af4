// Physical expressions evaluated against record batches

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Datum};
use arrow::compute::kernels::numeric;
use arrow::error::ArrowError;
use arrow_ord::cmp;

use crate::error::{Error, Result};
use crate::execution::accumulator::{Accumulator, AccumulatorFactory};
use crate::execution::batch::{ColumnVector, RecordBatch};
use crate::planner::logical_expr::{AggregateFunction, BooleanOp, MathOp};
use crate::types::{ArrowType, ScalarValue};

/// Executable expression; columns are referenced by position, not by name
#[derive(Debug, Clone)]
pub enum PhysicalExpr {
    Column(usize),
    Literal(ScalarValue),
    Boolean {
        op: BooleanOp,
        left: Box<PhysicalExpr>,
        right: Box<PhysicalExpr>,
    },
    Math {
        op: MathOp,
        left: Box<PhysicalExpr>,
        right: Box<PhysicalExpr>,
    },
}

impl PhysicalExpr {
    /// Evaluate against `batch`, producing one value per row
    pub fn evaluate(&self, batch: &RecordBatch) -> Result<ColumnVector> {
        match self {
            PhysicalExpr::Column(index) => batch.column(*index).cloned(),
            PhysicalExpr::Literal(value) => {
                Ok(ColumnVector::literal(value.clone(), batch.num_rows()))
            }
            PhysicalExpr::Boolean { op, left, right } => {
                let (l, r) = evaluate_operands(left, right, batch)?;
                evaluate_boolean(*op, &l, &r)
            }
            PhysicalExpr::Math { op, left, right } => {
                let (l, r) = evaluate_operands(left, right, batch)?;
                evaluate_math(*op, &l, &r)
            }
        }
    }
}

/// Evaluate both operands; they must agree in length and type, nothing is coerced
fn evaluate_operands(
    left: &PhysicalExpr,
    right: &PhysicalExpr,
    batch: &RecordBatch,
) -> Result<(ColumnVector, ColumnVector)> {
    let l = left.evaluate(batch)?;
    let r = right.evaluate(batch)?;
    if l.len() != r.len() {
        return Err(Error::TypeMismatch(format!(
            "operands have distinct lengths: {} and {}",
            l.len(),
            r.len()
        )));
    }
    if l.data_type() != r.data_type() {
        return Err(Error::TypeMismatch(format!(
            "operands have distinct types: {} and {}",
            l.data_type(),
            r.data_type()
        )));
    }
    Ok((l, r))
}

type CompareKernel = fn(&dyn Datum, &dyn Datum) -> std::result::Result<BooleanArray, ArrowError>;

fn evaluate_boolean(op: BooleanOp, left: &ColumnVector, right: &ColumnVector) -> Result<ColumnVector> {
    let mask = match op {
        BooleanOp::Eq => compare(cmp::eq, left, right)?,
        BooleanOp::Neq => compare(cmp::neq, left, right)?,
        BooleanOp::Gt => compare(cmp::gt, left, right)?,
        BooleanOp::GtEq => compare(cmp::gt_eq, left, right)?,
        BooleanOp::Lt => compare(cmp::lt, left, right)?,
        BooleanOp::LtEq => compare(cmp::lt_eq, left, right)?,
        BooleanOp::And | BooleanOp::Or => {
            if left.data_type() != ArrowType::Boolean {
                return Err(Error::TypeMismatch(format!(
                    "{} requires Boolean operands, got {}",
                    op.symbol(),
                    left.data_type()
                )));
            }
            let (l, r) = (left.to_array(), right.to_array());
            let (l, r) = (as_boolean(&l)?, as_boolean(&r)?);
            if op == BooleanOp::And {
                arrow::compute::and(l, r)?
            } else {
                arrow::compute::or(l, r)?
            }
        }
    };
    broadcast(Arc::new(mask), left.len())
}

fn compare(kernel: CompareKernel, left: &ColumnVector, right: &ColumnVector) -> Result<BooleanArray> {
    let (l, r) = (left.datum(), right.datum());
    Ok(kernel(&*l, &*r)?)
}

fn evaluate_math(op: MathOp, left: &ColumnVector, right: &ColumnVector) -> Result<ColumnVector> {
    if !left.data_type().is_numeric() {
        return Err(Error::TypeMismatch(format!(
            "{} requires numeric operands, got {}",
            op.symbol(),
            left.data_type()
        )));
    }
    let (l, r) = (left.datum(), right.datum());
    let result = match op {
        MathOp::Add => numeric::add(&*l, &*r)?,
        MathOp::Subtract => numeric::sub(&*l, &*r)?,
        MathOp::Multiply => numeric::mul(&*l, &*r)?,
        MathOp::Divide => numeric::div(&*l, &*r)?,
    };
    broadcast(result, left.len())
}

/// Kernels over two scalars return a single value; widen it back to `len` rows
fn broadcast(result: ArrayRef, len: usize) -> Result<ColumnVector> {
    if result.len() == len {
        return ColumnVector::try_from_array(result);
    }
    match ScalarValue::try_from_array(result.as_ref(), 0)? {
        Some(value) => Ok(ColumnVector::literal(value, len)),
        None => ColumnVector::try_from_array(arrow::array::new_null_array(result.data_type(), len)),
    }
}

fn as_boolean(array: &ArrayRef) -> Result<&BooleanArray> {
    array
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| Error::TypeMismatch("Array is not a boolean array".to_string()))
}

impl fmt::Display for PhysicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalExpr::Column(index) => write!(f, "#{}", index),
            PhysicalExpr::Literal(ScalarValue::Utf8(value)) => write!(f, "'{}'", value),
            PhysicalExpr::Literal(value) => write!(f, "{}", value),
            PhysicalExpr::Boolean { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            PhysicalExpr::Math { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
        }
    }
}

/// An aggregate function bound to its input expression and accumulator factory
#[derive(Debug, Clone)]
pub struct PhysicalAggregateExpr {
    pub func: AggregateFunction,
    pub input: PhysicalExpr,
    factory: AccumulatorFactory,
}

impl PhysicalAggregateExpr {
    pub fn new(func: AggregateFunction, input: PhysicalExpr, factory: AccumulatorFactory) -> Self {
        Self {
            func,
            input,
            factory,
        }
    }

    /// Fresh running state for one group
    pub fn create_accumulator(&self) -> Box<dyn Accumulator> {
        (self.factory)()
    }
}

impl fmt::Display for PhysicalAggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.func.name(), self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{employee_batch, values};

    fn lit(v: i64) -> Box<PhysicalExpr> {
        Box::new(PhysicalExpr::Literal(ScalarValue::Int64(v)))
    }

    fn math(op: MathOp, l: i64, r: i64) -> PhysicalExpr {
        PhysicalExpr::Math {
            op,
            left: lit(l),
            right: lit(r),
        }
    }

    #[test]
    fn test_math_on_literals() {
        let batch = employee_batch();
        let cases = [
            (MathOp::Subtract, 5),
            (MathOp::Add, 15),
            (MathOp::Multiply, 50),
            (MathOp::Divide, 2),
        ];
        for (op, expected) in cases {
            let result = math(op, 10, 5).evaluate(&batch).unwrap();
            assert!(result.is_literal());
            assert_eq!(result.len(), batch.num_rows());
            assert_eq!(result.get_value(0).unwrap(), Some(ScalarValue::Int64(expected)));
        }
    }

    #[test]
    fn test_math_on_column() {
        let batch = employee_batch();
        let expr = PhysicalExpr::Math {
            op: MathOp::Multiply,
            left: Box::new(PhysicalExpr::Column(2)),
            right: lit(2),
        };
        let result = expr.evaluate(&batch).unwrap();
        assert_eq!(
            values(&result),
            vec![
                Some(ScalarValue::Int64(200)),
                Some(ScalarValue::Int64(400)),
                Some(ScalarValue::Int64(100)),
                Some(ScalarValue::Int64(600)),
            ]
        );
    }

    #[test]
    fn test_column() {
        let batch = employee_batch();
        let result = PhysicalExpr::Column(0).evaluate(&batch).unwrap();
        assert_eq!(result.get_value(3).unwrap(), Some(ScalarValue::Int64(4)));
        assert!(PhysicalExpr::Column(7).evaluate(&batch).is_err());
    }

    #[test]
    fn test_comparison_mask() {
        let batch = employee_batch();
        let expr = PhysicalExpr::Boolean {
            op: BooleanOp::Eq,
            left: Box::new(PhysicalExpr::Column(1)),
            right: Box::new(PhysicalExpr::Literal(ScalarValue::Utf8("ES".into()))),
        };
        let mask = expr.evaluate(&batch).unwrap();
        assert_eq!(mask.data_type(), ArrowType::Boolean);
        let bits: Vec<_> = values(&mask);
        assert_eq!(
            bits,
            vec![
                Some(ScalarValue::Boolean(true)),
                Some(ScalarValue::Boolean(true)),
                Some(ScalarValue::Boolean(false)),
                Some(ScalarValue::Boolean(true)),
            ]
        );

        let expr = PhysicalExpr::Boolean {
            op: BooleanOp::Lt,
            left: Box::new(PhysicalExpr::Column(2)),
            right: lit(150),
        };
        let mask = expr.evaluate(&batch).unwrap();
        assert_eq!(mask.get_value(0).unwrap(), Some(ScalarValue::Boolean(true)));
        assert_eq!(mask.get_value(1).unwrap(), Some(ScalarValue::Boolean(false)));
    }

    #[test]
    fn test_and_or() {
        let batch = employee_batch();
        let es = PhysicalExpr::Boolean {
            op: BooleanOp::Eq,
            left: Box::new(PhysicalExpr::Column(1)),
            right: Box::new(PhysicalExpr::Literal(ScalarValue::Utf8("ES".into()))),
        };
        let rich = PhysicalExpr::Boolean {
            op: BooleanOp::GtEq,
            left: Box::new(PhysicalExpr::Column(2)),
            right: lit(200),
        };
        let both = PhysicalExpr::Boolean {
            op: BooleanOp::And,
            left: Box::new(es.clone()),
            right: Box::new(rich.clone()),
        };
        let either = PhysicalExpr::Boolean {
            op: BooleanOp::Or,
            left: Box::new(es),
            right: Box::new(rich),
        };
        let t = Some(ScalarValue::Boolean(true));
        let f = Some(ScalarValue::Boolean(false));
        assert_eq!(
            values(&both.evaluate(&batch).unwrap()),
            vec![f.clone(), t.clone(), f.clone(), t.clone()]
        );
        assert_eq!(
            values(&either.evaluate(&batch).unwrap()),
            vec![t.clone(), t.clone(), f, t]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let batch = employee_batch();
        let expr = PhysicalExpr::Boolean {
            op: BooleanOp::Eq,
            left: Box::new(PhysicalExpr::Column(2)),
            right: Box::new(PhysicalExpr::Literal(ScalarValue::Int32(100))),
        };
        assert!(matches!(expr.evaluate(&batch), Err(Error::TypeMismatch(_))));

        let expr = PhysicalExpr::Math {
            op: MathOp::Add,
            left: Box::new(PhysicalExpr::Column(1)),
            right: Box::new(PhysicalExpr::Column(1)),
        };
        assert!(matches!(expr.evaluate(&batch), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_display() {
        let expr = PhysicalExpr::Boolean {
            op: BooleanOp::Gt,
            left: Box::new(PhysicalExpr::Column(2)),
            right: lit(100),
        };
        assert_eq!(expr.to_string(), "#2 > 100");
    }
}
