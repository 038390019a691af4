// Logical to physical planning

use tracing::debug;

use crate::error::{Error, Result};
use crate::execution::accumulator::accumulator_factory;
use crate::execution::expressions::{PhysicalAggregateExpr, PhysicalExpr};
use crate::execution::operators::{
    FilterOperator, HashAggregateOperator, ProjectOperator, ScanOperator, SortKey, SortOperator,
};
use crate::execution::physical_plan::PhysicalPlan;
use crate::planner::logical_expr::LogicalExpr;
use crate::planner::logical_plan::LogicalPlan;

/// Compile `expr`, resolving column names to positions in `input`'s schema
///
/// Aliases compile to their inner expression; the name only matters to the
/// logical schema.
pub fn create_physical_expr(expr: &LogicalExpr, input: &LogicalPlan) -> Result<PhysicalExpr> {
    match expr {
        LogicalExpr::Column(name) => input
            .schema()?
            .index_of(name)
            .map(PhysicalExpr::Column)
            .ok_or_else(|| Error::UnknownColumn(name.clone())),
        LogicalExpr::Literal(value) => Ok(PhysicalExpr::Literal(value.clone())),
        LogicalExpr::Boolean { op, left, right } => Ok(PhysicalExpr::Boolean {
            op: *op,
            left: Box::new(create_physical_expr(left, input)?),
            right: Box::new(create_physical_expr(right, input)?),
        }),
        LogicalExpr::Math { op, left, right } => Ok(PhysicalExpr::Math {
            op: *op,
            left: Box::new(create_physical_expr(left, input)?),
            right: Box::new(create_physical_expr(right, input)?),
        }),
        LogicalExpr::Alias { expr, .. } => create_physical_expr(expr, input),
        LogicalExpr::Aggregate(aggr) => Err(Error::NotImplemented(format!(
            "aggregate expression {} outside of an aggregate plan",
            aggr
        ))),
    }
}

/// Translate a logical plan into an executable operator tree
pub fn create_physical_plan(plan: &LogicalPlan) -> Result<PhysicalPlan> {
    let physical = match plan {
        LogicalPlan::Scan(scan) => PhysicalPlan::Scan(ScanOperator::try_new(
            scan.path(),
            scan.source().clone(),
            scan.projection().to_vec(),
        )?),
        LogicalPlan::Projection { input, exprs } => {
            let exprs = exprs
                .iter()
                .map(|e| create_physical_expr(e, input))
                .collect::<Result<Vec<_>>>()?;
            PhysicalPlan::Projection {
                operator: ProjectOperator::new(exprs, plan.schema()?),
                input: Box::new(create_physical_plan(input)?),
            }
        }
        LogicalPlan::Filter { input, predicate } => {
            let predicate = create_physical_expr(predicate, input)?;
            let input = create_physical_plan(input)?;
            PhysicalPlan::Filter {
                operator: FilterOperator::new(predicate, input.schema()),
                input: Box::new(input),
            }
        }
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
        } => {
            let group_exprs = group_by
                .iter()
                .map(|e| create_physical_expr(e, input))
                .collect::<Result<Vec<_>>>()?;
            let aggregate_exprs = aggregates
                .iter()
                .map(|a| {
                    Ok(PhysicalAggregateExpr::new(
                        a.func,
                        create_physical_expr(&a.expr, input)?,
                        accumulator_factory(a.func),
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            PhysicalPlan::HashAggregate {
                operator: HashAggregateOperator::new(group_exprs, aggregate_exprs, plan.schema()?),
                input: Box::new(create_physical_plan(input)?),
            }
        }
        LogicalPlan::OrderBy { input, order_by } => {
            let schema = input.schema()?;
            let keys = order_by
                .iter()
                .map(|e| {
                    schema
                        .index_of(&e.column)
                        .map(|column| SortKey {
                            column,
                            ascending: e.ascending,
                        })
                        .ok_or_else(|| Error::UnknownColumn(e.column.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            PhysicalPlan::OrderBy {
                operator: SortOperator::new(keys, schema),
                input: Box::new(create_physical_plan(input)?),
            }
        }
    };
    debug!(node = %physical, "planned");
    Ok(physical)
}
