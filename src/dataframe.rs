// DataFrame API implementation

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::execution::Executor;
use crate::planner::logical_expr::{self, AggregateExpr, LogicalExpr};
use crate::planner::logical_plan::{LogicalPlan, OrderByExpr};
use crate::storage::{CsvDataSource, DataSource, ParquetDataSource};
use crate::types::SchemaRef;

/// DataFrame represents a lazy query plan that can be executed
/// Operations on DataFrame build up a logical plan tree
#[derive(Debug, Clone)]
pub struct DataFrame {
    plan: LogicalPlan,
}

/// Intermediate type for group_by + agg. Call .agg(aggregations) to complete.
#[derive(Debug, Clone)]
pub struct GroupedDataFrame {
    input: LogicalPlan,
    group_by: Vec<LogicalExpr>,
}

impl GroupedDataFrame {
    /// Apply aggregations and return a DataFrame
    pub fn agg(self, aggregates: Vec<AggregateExpr>) -> DataFrame {
        DataFrame {
            plan: LogicalPlan::aggregate(self.input, self.group_by, aggregates),
        }
    }
}

impl DataFrame {
    /// Wrap an already built logical plan
    pub fn new(plan: LogicalPlan) -> Self {
        Self { plan }
    }

    /// Scan every column of `source`, registered under `path`
    pub fn scan(path: impl Into<String>, source: Arc<dyn DataSource>) -> Result<Self> {
        Ok(Self::new(LogicalPlan::scan(path, source, vec![])?))
    }

    /// Create a DataFrame from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        Self::scan(name, Arc::new(CsvDataSource::new(path)))
    }

    /// Create a DataFrame from a Parquet file path
    ///
    /// # Arguments
    /// * `path` - Path to the Parquet file
    ///
    /// # Returns
    /// A new DataFrame with a Scan operation in the plan
    pub fn from_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        Self::scan(name, Arc::new(ParquetDataSource::new(path)))
    }

    /// Compute one output column per expression
    pub fn select(&self, exprs: Vec<LogicalExpr>) -> Self {
        Self::new(LogicalPlan::projection(self.plan.clone(), exprs))
    }

    /// Keep the rows matching `predicate`, which must be Boolean
    ///
    /// # Example
    /// ```ignore
    /// use mini_query_planner::dataframe::ExprBuilder;
    /// use mini_query_planner::planner::logical_expr::{col, lit_i64};
    /// df.filter(col("salary").gt(lit_i64(100)))?
    /// ```
    pub fn filter(&self, predicate: LogicalExpr) -> Result<Self> {
        Ok(Self::new(LogicalPlan::filter(self.plan.clone(), predicate)?))
    }

    /// Group by the given expressions. Returns a GroupedDataFrame; call .agg(aggregations) to complete.
    pub fn group_by(&self, group_by: Vec<LogicalExpr>) -> GroupedDataFrame {
        GroupedDataFrame {
            input: self.plan.clone(),
            group_by,
        }
    }

    /// Aggregate in one step: `aggregate(group_by, aggregates)`
    pub fn aggregate(&self, group_by: Vec<LogicalExpr>, aggregates: Vec<AggregateExpr>) -> Self {
        self.group_by(group_by).agg(aggregates)
    }

    /// Order by the given expressions. Use `asc("col")` and `desc("col")` to build OrderByExpr.
    pub fn order_by(&self, order_by: Vec<OrderByExpr>) -> Result<Self> {
        Ok(Self::new(LogicalPlan::order_by(self.plan.clone(), order_by)?))
    }

    pub fn schema(&self) -> Result<SchemaRef> {
        self.plan.schema()
    }

    pub fn logical_plan(&self) -> &LogicalPlan {
        &self.plan
    }

    /// Execute the query plan and return the results as a vector of RecordBatches
    pub fn collect(&self) -> Result<Vec<RecordBatch>> {
        Executor::new().execute(&self.plan)
    }
}

/// Extension trait for building expressions with method syntax
pub trait ExprBuilder {
    fn eq(&self, other: LogicalExpr) -> LogicalExpr;
    fn neq(&self, other: LogicalExpr) -> LogicalExpr;
    fn gt(&self, other: LogicalExpr) -> LogicalExpr;
    fn ge(&self, other: LogicalExpr) -> LogicalExpr;
    fn lt(&self, other: LogicalExpr) -> LogicalExpr;
    fn le(&self, other: LogicalExpr) -> LogicalExpr;
    fn and(&self, other: LogicalExpr) -> LogicalExpr;
    fn or(&self, other: LogicalExpr) -> LogicalExpr;
    fn add(&self, other: LogicalExpr) -> LogicalExpr;
    fn subtract(&self, other: LogicalExpr) -> LogicalExpr;
    fn multiply(&self, other: LogicalExpr) -> LogicalExpr;
    fn divide(&self, other: LogicalExpr) -> LogicalExpr;
    fn alias(&self, name: &str) -> LogicalExpr;
}

impl ExprBuilder for LogicalExpr {
    fn eq(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::eq(self.clone(), other)
    }

    fn neq(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::neq(self.clone(), other)
    }

    fn gt(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::gt(self.clone(), other)
    }

    fn ge(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::gt_eq(self.clone(), other)
    }

    fn lt(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::lt(self.clone(), other)
    }

    fn le(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::lt_eq(self.clone(), other)
    }

    fn and(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::and(self.clone(), other)
    }

    fn or(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::or(self.clone(), other)
    }

    fn add(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::add(self.clone(), other)
    }

    fn subtract(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::subtract(self.clone(), other)
    }

    fn multiply(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::multiply(self.clone(), other)
    }

    fn divide(&self, other: LogicalExpr) -> LogicalExpr {
        logical_expr::divide(self.clone(), other)
    }

    fn alias(&self, name: &str) -> LogicalExpr {
        logical_expr::alias(name, self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::logical_expr::{col, count, lit_i64, lit_str, max, sum};
    use crate::planner::logical_plan::desc;
    use crate::test_utils::{column_values, employee_source, field_names};
    use crate::types::ScalarValue;
    use std::io::Write;

    fn employees() -> DataFrame {
        DataFrame::scan("employee", employee_source()).unwrap()
    }

    #[test]
    fn test_builds_logical_plan() {
        let df = employees()
            .filter(col("country").eq(lit_str("ES")))
            .unwrap()
            .select(vec![col("id"), col("salary").multiply(lit_i64(2)).alias("double")]);
        assert_eq!(
            df.logical_plan().render(),
            "Projection: #id, #salary * 2 as double\n\
             \tFilter: #country = 'ES'\n\
             \t\tScan: 'employee'; projection=[]\n"
        );
        assert_eq!(field_names(&df.schema().unwrap()), vec!["id", "double"]);
    }

    #[test]
    fn test_group_by_and_order() {
        let df = employees()
            .group_by(vec![col("country")])
            .agg(vec![sum(col("salary")), count(col("id"))])
            .order_by(vec![desc("sum_salary")])
            .unwrap();
        let batches = df.collect().unwrap();
        assert_eq!(
            column_values(&batches, "country"),
            vec![
                Some(ScalarValue::Utf8("ES".into())),
                Some(ScalarValue::Utf8("FR".into()))
            ]
        );
        assert_eq!(
            column_values(&batches, "count_id"),
            vec![Some(ScalarValue::Int64(3)), Some(ScalarValue::Int64(1))]
        );
    }

    #[test]
    fn test_filter_rejects_non_boolean() {
        assert!(employees().filter(col("salary").add(lit_i64(1))).is_err());
    }

    #[test]
    fn test_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("employee.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"id,country,salary\n1,ES,100\n2,ES,200\n3,FR,50\n4,ES,300\n")
            .unwrap();

        let df = DataFrame::from_csv(&path)
            .unwrap()
            .filter(col("salary").ge(lit_i64(100)).and(col("country").neq(lit_str("FR"))))
            .unwrap()
            .aggregate(vec![], vec![max(col("salary"))]);
        let batches = df.collect().unwrap();
        assert_eq!(
            column_values(&batches, "max_salary"),
            vec![Some(ScalarValue::Int64(300))]
        );
    }
}
