// Physical plan tree

use std::fmt::{self, Write};

use tracing::trace;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::execution::operators::{
    BatchStream, FilterOperator, HashAggregateOperator, Operator, ProjectOperator, ScanOperator,
    SortOperator,
};
use crate::types::SchemaRef;

/// Executable plan: a tree of operators, each pulling batches from its input
///
/// Scans, projections and filters stream batch by batch. Aggregation and
/// sorting need their whole input and only yield once it is consumed.
pub enum PhysicalPlan {
    Scan(ScanOperator),
    Projection {
        input: Box<PhysicalPlan>,
        operator: ProjectOperator,
    },
    Filter {
        input: Box<PhysicalPlan>,
        operator: FilterOperator,
    },
    HashAggregate {
        input: Box<PhysicalPlan>,
        operator: HashAggregateOperator,
    },
    OrderBy {
        input: Box<PhysicalPlan>,
        operator: SortOperator,
    },
}

impl PhysicalPlan {
    pub fn schema(&self) -> SchemaRef {
        match self {
            PhysicalPlan::Scan(scan) => scan.schema(),
            PhysicalPlan::Projection { operator, .. } => operator.schema(),
            PhysicalPlan::Filter { operator, .. } => operator.schema(),
            PhysicalPlan::HashAggregate { operator, .. } => operator.schema(),
            PhysicalPlan::OrderBy { operator, .. } => operator.schema(),
        }
    }

    pub fn children(&self) -> Vec<&PhysicalPlan> {
        match self {
            PhysicalPlan::Scan(_) => vec![],
            PhysicalPlan::Projection { input, .. }
            | PhysicalPlan::Filter { input, .. }
            | PhysicalPlan::HashAggregate { input, .. }
            | PhysicalPlan::OrderBy { input, .. } => vec![input.as_ref()],
        }
    }

    /// Start executing; batches are produced as the returned stream is pulled
    pub fn execute(&self) -> Result<BatchStream<'_>> {
        match self {
            PhysicalPlan::Scan(scan) => Ok(Box::new(scan.read_all()?.into_iter().map(Ok))),
            PhysicalPlan::Projection { input, operator } => {
                let stream = input.execute()?;
                Ok(Box::new(
                    stream.map(move |batch| batch.and_then(|b| operator.execute(&b))),
                ))
            }
            PhysicalPlan::Filter { input, operator } => {
                let stream = input.execute()?;
                Ok(Box::new(
                    stream.map(move |batch| batch.and_then(|b| operator.execute(&b))),
                ))
            }
            PhysicalPlan::HashAggregate { input, operator } => {
                let batches = input.collect()?;
                Ok(Box::new(operator.execute_many(&batches)?.into_iter().map(Ok)))
            }
            PhysicalPlan::OrderBy { input, operator } => {
                let batches = input.collect()?;
                Ok(Box::new(operator.execute_many(&batches)?.into_iter().map(Ok)))
            }
        }
    }

    /// Run the plan to completion
    pub fn collect(&self) -> Result<Vec<RecordBatch>> {
        let batches = self.execute()?.collect::<Result<Vec<_>>>()?;
        trace!(node = %self, batches = batches.len(), "collected");
        Ok(batches)
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

impl fmt::Display for PhysicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalPlan::Scan(scan) => write!(
                f,
                "ScanExec: schema={}, projection={:?}",
                scan.schema(),
                scan.projection()
            ),
            PhysicalPlan::Projection { operator, .. } => {
                write!(f, "ProjectionExec: {}", join(operator.exprs()))
            }
            PhysicalPlan::Filter { operator, .. } => {
                write!(f, "FilterExec: {}", operator.predicate())
            }
            PhysicalPlan::HashAggregate { operator, .. } => write!(
                f,
                "HashAggregateExec: groupExpr={}, aggrExpr={}",
                join(operator.group_exprs()),
                join(operator.aggregate_exprs())
            ),
            PhysicalPlan::OrderBy { operator, .. } => {
                let keys = operator
                    .keys()
                    .iter()
                    .map(|k| format!("#{} {}", k.column, if k.ascending { "ASC" } else { "DESC" }))
                    .collect::<Vec<_>>();
                write!(f, "OrderByExec: {}", keys.join(", "))
            }
        }
    }
}
