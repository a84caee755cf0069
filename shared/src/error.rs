//! Errors raised by the computation layer

use thiserror::Error;

/// Failure of a settlement computation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

impl CalcError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CalcError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
