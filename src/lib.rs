// Public API for the query engine

pub mod dataframe;
pub mod error;
pub mod execution;
pub mod optimizer;
pub mod planner;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use dataframe::DataFrame;
pub use error::{Error, Result};
