//! Error types for SQL fragment generation.

use thiserror::Error;

/// Errors returned by the generation layer.
///
/// Every error is a caller or configuration defect: generation is
/// deterministic, so retrying with the same input gives the same failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SqlGenError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Malformed aggregation formula '{formula}': {reason}")]
    MalformedAggregationFormula { formula: String, reason: String },
}

impl SqlGenError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SqlGenError::InvalidInput(msg.into())
    }
}

pub type SqlGenResult<T> = Result<T, SqlGenError>;
