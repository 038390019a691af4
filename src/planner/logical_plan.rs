// Logical query plan

use std::fmt::{self, Write};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::planner::logical_expr::{AggregateExpr, LogicalExpr};
use crate::storage::DataSource;
use crate::types::{ArrowType, Schema, SchemaRef};

/// Scan of a data source, the leaf of every plan
///
/// The projected schema is read once at construction, since asking the source
/// for its schema may hit storage.
#[derive(Debug, Clone)]
pub struct TableScan {
    path: String,
    source: Arc<dyn DataSource>,
    projection: Vec<String>,
    schema: SchemaRef,
}

impl TableScan {
    /// Create a scan reading `projection` (empty for all columns) from `source`
    pub fn try_new(
        path: impl Into<String>,
        source: Arc<dyn DataSource>,
        projection: Vec<String>,
    ) -> Result<Self> {
        let schema = Arc::new(source.schema()?.select(&projection));
        Ok(Self {
            path: path.into(),
            source,
            projection,
            schema,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}

/// Expression for ORDER BY: column name and direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByExpr {
    pub column: String,
    pub ascending: bool,
}

/// ORDER BY ascending
pub fn asc(column: &str) -> OrderByExpr {
    OrderByExpr {
        column: column.to_string(),
        ascending: true,
    }
}

/// ORDER BY descending
pub fn desc(column: &str) -> OrderByExpr {
    OrderByExpr {
        column: column.to_string(),
        ascending: false,
    }
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "#{} {}", self.column, direction)
    }
}

/// Logical query plan representing a query as a tree of operations
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// Read columns from a data source
    Scan(TableScan),
    /// Compute one output column per expression
    Projection {
        input: Box<LogicalPlan>,
        exprs: Vec<LogicalExpr>,
    },
    /// Filter rows based on a boolean predicate
    Filter {
        input: Box<LogicalPlan>,
        predicate: LogicalExpr,
    },
    /// Aggregate with GROUP BY
    Aggregate {
        input: Box<LogicalPlan>,
        group_by: Vec<LogicalExpr>,
        aggregates: Vec<AggregateExpr>,
    },
    /// ORDER BY
    OrderBy {
        input: Box<LogicalPlan>,
        order_by: Vec<OrderByExpr>,
    },
}

impl LogicalPlan {
    pub fn scan(
        path: impl Into<String>,
        source: Arc<dyn DataSource>,
        projection: Vec<String>,
    ) -> Result<Self> {
        Ok(LogicalPlan::Scan(TableScan::try_new(path, source, projection)?))
    }

    pub fn projection(input: LogicalPlan, exprs: Vec<LogicalExpr>) -> Self {
        LogicalPlan::Projection {
            input: Box::new(input),
            exprs,
        }
    }

    /// Filter `input` by `predicate`, which must produce a Boolean field
    pub fn filter(input: LogicalPlan, predicate: LogicalExpr) -> Result<Self> {
        let field = predicate.to_field(&input)?;
        if field.data_type() != ArrowType::Boolean {
            return Err(Error::TypeMismatch(format!(
                "filter predicate {} is {}, not Boolean",
                predicate,
                field.data_type()
            )));
        }
        Ok(LogicalPlan::Filter {
            input: Box::new(input),
            predicate,
        })
    }

    pub fn aggregate(
        input: LogicalPlan,
        group_by: Vec<LogicalExpr>,
        aggregates: Vec<AggregateExpr>,
    ) -> Self {
        LogicalPlan::Aggregate {
            input: Box::new(input),
            group_by,
            aggregates,
        }
    }

    /// Sort `input`; every ordering column must exist in its schema
    pub fn order_by(input: LogicalPlan, order_by: Vec<OrderByExpr>) -> Result<Self> {
        let schema = input.schema()?;
        for e in &order_by {
            schema.field_with_name(&e.column)?;
        }
        Ok(LogicalPlan::OrderBy {
            input: Box::new(input),
            order_by,
        })
    }

    /// Get the output schema for this plan node
    ///
    /// Only scans keep their schema; every other node derives it on each call.
    pub fn schema(&self) -> Result<SchemaRef> {
        match self {
            LogicalPlan::Scan(scan) => Ok(scan.schema.clone()),
            LogicalPlan::Projection { input, exprs } => {
                let fields = exprs
                    .iter()
                    .map(|e| e.to_field(input))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(Schema::new(fields)))
            }
            // Filtering and sorting never change the shape
            LogicalPlan::Filter { input, .. } | LogicalPlan::OrderBy { input, .. } => {
                input.schema()
            }
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggregates,
            } => {
                // Aggregate columns precede group-by columns
                let mut fields = aggregates
                    .iter()
                    .map(|a| a.to_field(input))
                    .collect::<Result<Vec<_>>>()?;
                for e in group_by {
                    fields.push(e.to_field(input)?);
                }
                Ok(Arc::new(Schema::new(fields)))
            }
        }
    }

    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::Scan(_) => vec![],
            LogicalPlan::Projection { input, .. }
            | LogicalPlan::Filter { input, .. }
            | LogicalPlan::Aggregate { input, .. }
            | LogicalPlan::OrderBy { input, .. } => vec![input.as_ref()],
        }
    }

    /// Pre-order dump of the tree, one node per line, indented with one tab per level
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, indent: usize, out: &mut String) {
        out.push_str(&"\t".repeat(indent));
        let _ = writeln!(out, "{}", self);
        for child in self.children() {
            child.render_into(indent + 1, out);
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalPlan::Scan(scan) => {
                write!(f, "Scan: '{}'; projection={:?}", scan.path, scan.projection)
            }
            LogicalPlan::Projection { exprs, .. } => write!(f, "Projection: {}", join(exprs)),
            LogicalPlan::Filter { predicate, .. } => write!(f, "Filter: {}", predicate),
            LogicalPlan::Aggregate {
                group_by,
                aggregates,
                ..
            } => write!(
                f,
                "Aggregate: groupBy=[{}], aggregateExpr=[{}]",
                join(group_by),
                join(aggregates)
            ),
            LogicalPlan::OrderBy { order_by, .. } => write!(f, "OrderBy: {}", join(order_by)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::logical_expr::{col, eq, lit_i64, lit_str, multiply, sum};
    use crate::test_utils::{employee_scan, employee_source, field_names};
    use crate::types::Field;

    #[test]
    fn test_scan_schema_applies_projection() {
        let scan = LogicalPlan::scan(
            "employee",
            employee_source(),
            vec!["salary".to_string(), "id".to_string()],
        )
        .unwrap();
        assert_eq!(field_names(&scan.schema().unwrap()), vec!["id", "salary"]);
        assert!(scan.children().is_empty());

        let all = employee_scan();
        assert_eq!(
            field_names(&all.schema().unwrap()),
            vec!["id", "country", "salary"]
        );
    }

    #[test]
    fn test_projection_schema() {
        let plan = LogicalPlan::projection(
            employee_scan(),
            vec![col("salary"), multiply(col("salary"), lit_i64(2))],
        );
        let schema = plan.schema().unwrap();
        assert_eq!(
            schema.fields(),
            &[
                Field::new("salary", ArrowType::Int64),
                Field::new("multiply", ArrowType::Int64)
            ]
        );
        assert!(LogicalPlan::projection(employee_scan(), vec![col("ghost")])
            .schema()
            .is_err());
    }

    #[test]
    fn test_filter_keeps_input_schema() {
        let scan = employee_scan();
        let plan = LogicalPlan::filter(scan.clone(), eq(col("country"), lit_str("ES"))).unwrap();
        assert_eq!(plan.schema().unwrap(), scan.schema().unwrap());
        assert_eq!(plan.children().len(), 1);
    }

    #[test]
    fn test_filter_rejects_non_boolean_predicate() {
        assert!(matches!(
            LogicalPlan::filter(employee_scan(), col("salary")),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_aggregate_fields_precede_group_by_fields() {
        let plan = LogicalPlan::aggregate(
            employee_scan(),
            vec![col("country")],
            vec![sum(col("salary"))],
        );
        let schema = plan.schema().unwrap();
        assert_eq!(
            schema.fields(),
            &[
                Field::new("sum_salary", ArrowType::Int64),
                Field::new("country", ArrowType::Utf8)
            ]
        );
    }

    #[test]
    fn test_order_by_validates_columns() {
        assert!(LogicalPlan::order_by(employee_scan(), vec![desc("salary")]).is_ok());
        assert!(matches!(
            LogicalPlan::order_by(employee_scan(), vec![asc("ghost")]),
            Err(Error::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_render_tree() {
        let aggregate = LogicalPlan::aggregate(
            employee_scan(),
            vec![col("country")],
            vec![sum(col("salary"))],
        );
        let filter = LogicalPlan::filter(aggregate, eq(col("country"), lit_str("ES"))).unwrap();
        let plan = LogicalPlan::projection(filter, vec![col("country"), col("sum_salary")]);

        let expected = "Projection: #country, #sum_salary\n\
                        \tFilter: #country = 'ES'\n\
                        \t\tAggregate: groupBy=[#country], aggregateExpr=[SUM(#salary)]\n\
                        \t\t\tScan: 'employee'; projection=[]\n";
        assert_eq!(plan.render(), expected);
    }
}
