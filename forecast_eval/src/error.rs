//! Error types for the forecast_eval crate

use eval_math::MathError;
use thiserror::Error;

/// Custom error types for the forecast_eval crate
#[derive(Debug, Error)]
pub enum EvalError {
    /// A forecast series whose length differs from the horizon
    #[error("{context}: {what} length {actual} does not match horizon {expected}")]
    LengthMismatch {
        context: String,
        what: String,
        actual: usize,
        expected: usize,
    },

    /// Any other breach of the forecast result contract
    #[error("{context}: {message}")]
    ContractViolation { context: String, message: String },

    /// Failure raised by a model's fit or predict
    #[error("Model error: {0}")]
    Model(String),

    /// Error related to data validation or loading
    #[error("Data error: {0}")]
    Data(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unknown or malformed registry entry
    #[error("Registry error: {0}")]
    Registry(String),

    /// Event recorder failure
    #[error("Recorder error: {0}")]
    Recorder(String),

    /// Error from metric computations
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EvalError {
    pub(crate) fn contract(context: &str, message: impl Into<String>) -> Self {
        EvalError::ContractViolation {
            context: context.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn length(
        context: &str,
        what: impl Into<String>,
        actual: usize,
        expected: usize,
    ) -> Self {
        EvalError::LengthMismatch {
            context: context.to_string(),
            what: what.into(),
            actual,
            expected,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, EvalError>;
