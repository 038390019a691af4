// Column pruning at scans

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::optimizer::OptimizationRule;
use crate::planner::logical_expr::LogicalExpr;
use crate::planner::logical_plan::LogicalPlan;

/// Narrows every scan to the columns referenced by the nodes above it
///
/// The plan is walked top-down while a set of required column names grows.
/// At the scan the set, sorted and restricted to the source's columns, becomes
/// the new projection. Names produced above the scan (aggregate outputs,
/// aliases) never reach the source.
pub struct ProjectionPushDown;

impl OptimizationRule for ProjectionPushDown {
    fn name(&self) -> &'static str {
        "projection_pushdown"
    }

    fn apply(&self, plan: &LogicalPlan) -> Result<LogicalPlan> {
        let mut required = BTreeSet::new();
        push_down(plan, &mut required)
    }
}

fn push_down(plan: &LogicalPlan, required: &mut BTreeSet<String>) -> Result<LogicalPlan> {
    match plan {
        LogicalPlan::Scan(scan) => {
            let source_schema = scan.source().schema()?;
            let projection: Vec<String> = required
                .iter()
                .filter(|name| source_schema.index_of(name).is_some())
                .cloned()
                .collect();
            debug!(path = scan.path(), projection = ?projection, "pushed projection to scan");
            LogicalPlan::scan(scan.path(), scan.source().clone(), projection)
        }
        LogicalPlan::Projection { input, exprs } => {
            extract_columns(exprs, required);
            Ok(LogicalPlan::Projection {
                input: Box::new(push_down(input, required)?),
                exprs: exprs.clone(),
            })
        }
        LogicalPlan::Filter { input, predicate } => {
            extract_columns(std::slice::from_ref(predicate), required);
            Ok(LogicalPlan::Filter {
                input: Box::new(push_down(input, required)?),
                predicate: predicate.clone(),
            })
        }
        LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
        } => {
            extract_columns(group_by, required);
            for aggr in aggregates {
                extract_columns(std::slice::from_ref(aggr.expr.as_ref()), required);
            }
            Ok(LogicalPlan::Aggregate {
                input: Box::new(push_down(input, required)?),
                group_by: group_by.clone(),
                aggregates: aggregates.clone(),
            })
        }
        LogicalPlan::OrderBy { input, order_by } => {
            required.extend(order_by.iter().map(|e| e.column.clone()));
            Ok(LogicalPlan::OrderBy {
                input: Box::new(push_down(input, required)?),
                order_by: order_by.clone(),
            })
        }
    }
}

/// Add every column name referenced by `exprs` to `acc`
pub fn extract_columns(exprs: &[LogicalExpr], acc: &mut BTreeSet<String>) {
    for expr in exprs {
        match expr {
            LogicalExpr::Column(name) => {
                acc.insert(name.clone());
            }
            LogicalExpr::Literal(_) => {}
            LogicalExpr::Boolean { left, right, .. } | LogicalExpr::Math { left, right, .. } => {
                extract_columns(std::slice::from_ref(left.as_ref()), acc);
                extract_columns(std::slice::from_ref(right.as_ref()), acc);
            }
            LogicalExpr::Aggregate(aggr) => {
                extract_columns(std::slice::from_ref(aggr.expr.as_ref()), acc)
            }
            LogicalExpr::Alias { expr, .. } => {
                extract_columns(std::slice::from_ref(expr.as_ref()), acc)
            }
        }
    }
}
