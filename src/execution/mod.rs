// Physical execution: record batches, expressions, operators and the executor

pub mod accumulator;
pub mod batch;
pub mod executor;
pub mod expressions;
pub mod operators;
pub mod physical_plan;

pub use batch::{ColumnVector, RecordBatch};
pub use executor::Executor;
pub use physical_plan::PhysicalPlan;
