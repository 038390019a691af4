// Logical plans and their compilation to physical plans

pub mod logical_expr;
pub mod logical_plan;
pub mod physical_planner;

pub use logical_expr::{AggregateExpr, AggregateFunction, BooleanOp, LogicalExpr, MathOp};
pub use logical_plan::{LogicalPlan, OrderByExpr, TableScan};
pub use physical_planner::{create_physical_expr, create_physical_plan};
