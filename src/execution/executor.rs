// Execution engine coordinator

use tracing::debug;

use crate::error::Result;
use crate::execution::batch::RecordBatch;
use crate::execution::physical_plan::PhysicalPlan;
use crate::optimizer::Optimizer;
use crate::planner::logical_plan::LogicalPlan;
use crate::planner::physical_planner;

/// Executor that coordinates the execution of logical plans
/// Optimizes them, converts them to physical operators and runs them
pub struct Executor {
    optimizer: Optimizer,
    optimize: bool,
}

impl Executor {
    /// Create a new executor applying the default optimization rules
    pub fn new() -> Self {
        Self {
            optimizer: Optimizer::new(),
            optimize: true,
        }
    }

    /// Create an executor that runs plans exactly as built
    pub fn without_optimizer() -> Self {
        Self {
            optimizer: Optimizer::with_rules(vec![]),
            optimize: false,
        }
    }

    /// Create an executor using a custom optimizer
    pub fn with_optimizer(optimizer: Optimizer) -> Self {
        Self {
            optimizer,
            optimize: true,
        }
    }

    /// Optimize (when enabled) and compile `plan` without running it
    pub fn create_physical_plan(&self, plan: &LogicalPlan) -> Result<PhysicalPlan> {
        if self.optimize {
            let optimized = self.optimizer.optimize(plan)?;
            physical_planner::create_physical_plan(&optimized)
        } else {
            physical_planner::create_physical_plan(plan)
        }
    }

    /// Execute a logical plan and return the results
    ///
    /// # Arguments
    /// * `plan` - The logical plan to execute
    ///
    /// # Returns
    /// Result containing vector of RecordBatches with the query results
    pub fn execute(&self, plan: &LogicalPlan) -> Result<Vec<RecordBatch>> {
        debug!(optimize = self.optimize, "executing query\n{}", plan.render());
        let physical = self.create_physical_plan(plan)?;
        let batches = physical.collect()?;
        debug!(
            batches = batches.len(),
            rows = batches.iter().map(|b| b.num_rows()).sum::<usize>(),
            "query complete"
        );
        Ok(batches)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}
