//! Query optimizer
//!
//! Applies rewrite rules to logical plans so that execution does less work.

pub mod projection_pushdown;

pub use projection_pushdown::{extract_columns, ProjectionPushDown};

use tracing::debug;

use crate::error::Result;
use crate::planner::logical_plan::LogicalPlan;

/// A rewrite of logical plans that never changes query results
pub trait OptimizationRule: Send + Sync {
    /// Rule name for debugging
    fn name(&self) -> &'static str;

    /// Build the rewritten plan; the input plan is left untouched
    fn apply(&self, plan: &LogicalPlan) -> Result<LogicalPlan>;
}

/// Query optimizer that applies a sequence of optimization rules
pub struct Optimizer {
    rules: Vec<Box<dyn OptimizationRule>>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Create a new optimizer with default rules
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(ProjectionPushDown)],
        }
    }

    /// Create an optimizer with custom rules
    pub fn with_rules(rules: Vec<Box<dyn OptimizationRule>>) -> Self {
        Self { rules }
    }

    /// Optimize a logical plan by applying all rules in order
    pub fn optimize(&self, plan: &LogicalPlan) -> Result<LogicalPlan> {
        let mut current = plan.clone();
        for rule in &self.rules {
            current = rule.apply(&current)?;
            debug!(rule = rule.name(), "applied optimization rule");
        }
        Ok(current)
    }

    /// Get the names of all optimization rules
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::logical_expr::col;
    use crate::test_utils::employee_scan;

    #[test]
    fn test_default_rules() {
        assert_eq!(Optimizer::new().rule_names(), vec!["projection_pushdown"]);
        assert!(Optimizer::with_rules(vec![]).rule_names().is_empty());
    }

    #[test]
    fn test_without_rules_plan_is_unchanged() {
        let plan = LogicalPlan::projection(employee_scan(), vec![col("id")]);
        let optimized = Optimizer::with_rules(vec![]).optimize(&plan).unwrap();
        assert_eq!(optimized.render(), plan.render());
    }

    #[test]
    fn test_optimize_leaves_input_untouched() {
        let plan = LogicalPlan::projection(employee_scan(), vec![col("id")]);
        let before = plan.render();
        let optimized = Optimizer::new().optimize(&plan).unwrap();
        assert_eq!(plan.render(), before);
        assert_eq!(
            optimized.render(),
            "Projection: #id\n\tScan: 'employee'; projection=[\"id\"]\n"
        );
    }
}
