// Error types shared by every layer of the engine

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Errors raised while building, optimizing, planning or executing a query.
///
/// Errors propagate synchronously to the caller; no layer retries or falls back
/// to partial results.
#[derive(Error, Debug)]
pub enum Error {
    /// A column reference could not be resolved against a schema
    #[error("No column named '{0}'")]
    UnknownColumn(String),

    /// An alias target collides with an existing field
    #[error("Column '{0}' already exists")]
    AlreadyExistsColumn(String),

    /// Operands or columns of incompatible type or length
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A record batch whose columns disagree with its schema
    #[error("Invalid record batch: {0}")]
    InvalidBatch(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
