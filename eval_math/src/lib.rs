//! # Eval Math
//!
//! Numeric scoring functions for forecast evaluation.
//!
//! - [`point`]: MAE, MSE, RMSE, SMAPE and MASE over equal-length series
//! - [`probabilistic`]: the empirical CRPS and its region-penalized
//!   variant RCRPS over sample sets
//! - [`stats`]: small summary helpers used when aggregating scores
//! - [`serde_nan`]: reading persisted scores that were NaN
//!
//! Everything here is a pure function of its inputs. Degenerate but valid
//! inputs (a zero/zero SMAPE term, a MASE without enough in-sample history)
//! resolve to a defined value or NaN; only shape problems are errors.

use thiserror::Error;

pub mod point;
pub mod probabilistic;
pub mod serde_nan;
pub mod stats;

pub use point::{mae, mase, mse, rmse, smape, PointMetrics};
pub use probabilistic::{crps, rcrps, rcrps_over_horizon, RegionOfInterest};

/// Errors that can occur while scoring forecasts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Check that two series can be compared element by element.
pub(crate) fn check_pair(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot score an empty series".to_string(),
        ));
    }
    if y_true.len() != y_pred.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            y_true.len(),
            y_pred.len()
        )));
    }
    Ok(())
}
