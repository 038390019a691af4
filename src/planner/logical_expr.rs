// Logical expressions

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::planner::logical_plan::LogicalPlan;
use crate::types::{ArrowType, Field, ScalarValue};

/// Expression over the columns of a logical plan, referencing columns by name
#[derive(Debug, Clone)]
pub enum LogicalExpr {
    /// Column reference by name
    Column(String),
    /// Literal value
    Literal(ScalarValue),
    /// Comparison or boolean connective; always yields a Boolean
    Boolean {
        op: BooleanOp,
        left: Box<LogicalExpr>,
        right: Box<LogicalExpr>,
    },
    /// Arithmetic; yields the left operand's type
    Math {
        op: MathOp,
        left: Box<LogicalExpr>,
        right: Box<LogicalExpr>,
    },
    Aggregate(AggregateExpr),
    /// Rename of another expression
    Alias { name: String, expr: Box<LogicalExpr> },
}

/// Boolean operators for expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Eq,   // =
    Neq,  // !=
    Gt,   // >
    GtEq, // >=
    Lt,   // <
    LtEq, // <=
    And,
    Or,
}

impl BooleanOp {
    /// Logical name, also the name of the resulting field
    pub fn name(self) -> &'static str {
        match self {
            BooleanOp::Eq => "eq",
            BooleanOp::Neq => "neq",
            BooleanOp::Gt => "gt",
            BooleanOp::GtEq => "gteq",
            BooleanOp::Lt => "lt",
            BooleanOp::LtEq => "lteq",
            BooleanOp::And => "and",
            BooleanOp::Or => "or",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BooleanOp::Eq => "=",
            BooleanOp::Neq => "!=",
            BooleanOp::Gt => ">",
            BooleanOp::GtEq => ">=",
            BooleanOp::Lt => "<",
            BooleanOp::LtEq => "<=",
            BooleanOp::And => "AND",
            BooleanOp::Or => "OR",
        }
    }
}

/// Arithmetic operators for expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl MathOp {
    pub fn name(self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Subtract => "subtract",
            MathOp::Multiply => "multiply",
            MathOp::Divide => "divide",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            MathOp::Add => "+",
            MathOp::Subtract => "-",
            MathOp::Multiply => "*",
            MathOp::Divide => "/",
        }
    }
}

/// Aggregate function for GROUP BY aggregations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

impl FromStr for AggregateFunction {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Ok(AggregateFunction::Count),
            "SUM" => Ok(AggregateFunction::Sum),
            "AVG" => Ok(AggregateFunction::Avg),
            "MIN" => Ok(AggregateFunction::Min),
            "MAX" => Ok(AggregateFunction::Max),
            _ => Err(Error::NotImplemented(format!(
                "aggregate function '{}'",
                name
            ))),
        }
    }
}

/// An aggregate function applied to an expression, e.g. SUM(#salary)
#[derive(Debug, Clone)]
pub struct AggregateExpr {
    pub func: AggregateFunction,
    pub expr: Box<LogicalExpr>,
}

impl AggregateExpr {
    pub fn new(func: AggregateFunction, expr: LogicalExpr) -> Self {
        Self {
            func,
            expr: Box::new(expr),
        }
    }

    /// Field named `<func>_<input>`, e.g. `sum_salary`.
    ///
    /// COUNT always yields Int64 and AVG Float64; the other functions keep the
    /// input's type.
    pub fn to_field(&self, input: &LogicalPlan) -> Result<Field> {
        let inner = self.expr.to_field(input)?;
        let data_type = match self.func {
            AggregateFunction::Count => ArrowType::Int64,
            AggregateFunction::Avg => ArrowType::Float64,
            AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => {
                inner.data_type()
            }
        };
        let name = format!("{}_{}", self.func.name().to_lowercase(), inner.name());
        Ok(Field::new(name, data_type))
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.func.name(), self.expr)
    }
}

impl LogicalExpr {
    /// Derive the field this expression produces against `input`'s schema
    pub fn to_field(&self, input: &LogicalPlan) -> Result<Field> {
        match self {
            LogicalExpr::Column(name) => Ok(input.schema()?.field_with_name(name)?.clone()),
            LogicalExpr::Literal(value) => Ok(Field::new(value.to_string(), value.data_type())),
            LogicalExpr::Boolean { op, .. } => Ok(Field::new(op.name(), ArrowType::Boolean)),
            LogicalExpr::Math { op, left, .. } => {
                Ok(Field::new(op.name(), left.to_field(input)?.data_type()))
            }
            LogicalExpr::Aggregate(aggr) => aggr.to_field(input),
            LogicalExpr::Alias { name, expr } => {
                let inner = expr.to_field(input)?;
                if inner.name() != name && input.schema()?.index_of(name).is_some() {
                    return Err(Error::AlreadyExistsColumn(name.clone()));
                }
                Ok(Field::new(name.as_str(), inner.data_type()))
            }
        }
    }
}

impl fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalExpr::Column(name) => write!(f, "#{}", name),
            LogicalExpr::Literal(ScalarValue::Utf8(value)) => write!(f, "'{}'", value),
            LogicalExpr::Literal(value) => write!(f, "{}", value),
            LogicalExpr::Boolean { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            LogicalExpr::Math { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            LogicalExpr::Aggregate(aggr) => write!(f, "{}", aggr),
            LogicalExpr::Alias { name, expr } => write!(f, "{} as {}", expr, name),
        }
    }
}

/// Column reference
pub fn col(name: &str) -> LogicalExpr {
    LogicalExpr::Column(name.to_string())
}

pub fn lit_str(value: &str) -> LogicalExpr {
    LogicalExpr::Literal(ScalarValue::Utf8(value.to_string()))
}

pub fn lit_i64(value: i64) -> LogicalExpr {
    LogicalExpr::Literal(ScalarValue::Int64(value))
}

pub fn lit_i32(value: i32) -> LogicalExpr {
    LogicalExpr::Literal(ScalarValue::Int32(value))
}

pub fn lit_f64(value: f64) -> LogicalExpr {
    LogicalExpr::Literal(ScalarValue::Float64(value))
}

pub fn lit_bool(value: bool) -> LogicalExpr {
    LogicalExpr::Literal(ScalarValue::Boolean(value))
}

fn boolean(op: BooleanOp, left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Boolean {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn math(op: MathOp, left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Math {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn eq(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::Eq, left, right)
}

pub fn neq(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::Neq, left, right)
}

pub fn gt(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::Gt, left, right)
}

pub fn gt_eq(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::GtEq, left, right)
}

pub fn lt(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::Lt, left, right)
}

pub fn lt_eq(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::LtEq, left, right)
}

pub fn and(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::And, left, right)
}

pub fn or(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    boolean(BooleanOp::Or, left, right)
}

pub fn add(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    math(MathOp::Add, left, right)
}

pub fn subtract(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    math(MathOp::Subtract, left, right)
}

pub fn multiply(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    math(MathOp::Multiply, left, right)
}

pub fn divide(left: LogicalExpr, right: LogicalExpr) -> LogicalExpr {
    math(MathOp::Divide, left, right)
}

pub fn alias(name: &str, expr: LogicalExpr) -> LogicalExpr {
    LogicalExpr::Alias {
        name: name.to_string(),
        expr: Box::new(expr),
    }
}

/// Aggregate by function name, e.g. `aggregate("SUM", col("salary"))`
pub fn aggregate(name: &str, expr: LogicalExpr) -> Result<AggregateExpr> {
    Ok(AggregateExpr::new(name.parse()?, expr))
}

pub fn sum(expr: LogicalExpr) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Sum, expr)
}

pub fn min(expr: LogicalExpr) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Min, expr)
}

pub fn max(expr: LogicalExpr) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Max, expr)
}

pub fn avg(expr: LogicalExpr) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Avg, expr)
}

pub fn count(expr: LogicalExpr) -> AggregateExpr {
    AggregateExpr::new(AggregateFunction::Count, expr)
}
