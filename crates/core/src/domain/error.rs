// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Status set '{class}' must not be empty")]
    EmptyStatusSet { class: &'static str },

    #[error("Invalid benchmark curve: {0}")]
    InvalidBenchmarkCurve(String),

    #[error("Invalid look-back period: {0} days")]
    InvalidPeriod(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
