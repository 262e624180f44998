//! Error types for expire-align operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpireError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Datetime out of range: {0}")]
    OutOfRange(String),
}

impl ExpireError {
    pub(crate) fn non_positive_interval(interval: i64) -> Self {
        ExpireError::InvalidArgument(format!("interval must be greater than 0 (got {interval})"))
    }

    pub(crate) fn unknown_interval_type(value: impl std::fmt::Display) -> Self {
        ExpireError::InvalidArgument(format!("unknown interval type: '{value}'"))
    }
}

pub type Result<T> = std::result::Result<T, ExpireError>;
