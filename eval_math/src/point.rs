//! Point-forecast error metrics
//!
//! All functions take the observed series first and the forecast second.

use crate::{check_pair, Result};
use serde::{Deserialize, Serialize};

/// Mean Absolute Error
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    Ok(mean_absolute_difference(y_true, y_pred))
}

/// Mean Squared Error
pub fn mse(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Root Mean Squared Error
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    Ok(mse(y_true, y_pred)?.sqrt())
}

/// Symmetric Mean Absolute Percentage Error, as a fraction (not scaled by 100).
///
/// Each term is `|a - f| / ((|a| + |f|) / 2)`. When both values are zero the
/// denominator is replaced with 1.0, so the term is 0 rather than NaN.
pub fn smape(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&a, &f)| {
            let denom = (a.abs() + f.abs()) / 2.0;
            let denom = if denom == 0.0 { 1.0 } else { denom };
            (a - f).abs() / denom
        })
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Mean Absolute Scaled Error.
///
/// The MAE of the forecast divided by the mean absolute first difference of
/// `insample`. Returns NaN when `insample` has fewer than two points, since
/// there is no naive one-step error to scale by. A zero scale is replaced
/// with 1.0.
pub fn mase(y_true: &[f64], y_pred: &[f64], insample: &[f64]) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    if insample.len() < 2 {
        return Ok(f64::NAN);
    }

    let scale = insample
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .sum::<f64>()
        / (insample.len() - 1) as f64;
    let scale = if scale == 0.0 { 1.0 } else { scale };

    Ok(mean_absolute_difference(y_true, y_pred) / scale)
}

fn mean_absolute_difference(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    sum / y_true.len() as f64
}

/// The point metrics reported for one backtest window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMetrics {
    /// Mean Absolute Error
    #[serde(deserialize_with = "crate::serde_nan::deserialize")]
    pub mae: f64,
    /// Root Mean Squared Error
    #[serde(deserialize_with = "crate::serde_nan::deserialize")]
    pub rmse: f64,
    /// Symmetric Mean Absolute Percentage Error
    #[serde(deserialize_with = "crate::serde_nan::deserialize")]
    pub smape: f64,
    /// Mean Absolute Scaled Error (NaN without enough in-sample history)
    #[serde(deserialize_with = "crate::serde_nan::deserialize")]
    pub mase: f64,
}

impl PointMetrics {
    /// Score a forecast against actuals, scaling MASE by `insample`.
    pub fn compute(y_true: &[f64], y_pred: &[f64], insample: &[f64]) -> Result<Self> {
        Ok(Self {
            mae: mae(y_true, y_pred)?,
            rmse: rmse(y_true, y_pred)?,
            smape: smape(y_true, y_pred)?,
            mase: mase(y_true, y_pred, insample)?,
        })
    }

    /// Metric names paired with their values, in a fixed order.
    pub fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("mae", self.mae),
            ("rmse", self.rmse),
            ("smape", self.smape),
            ("mase", self.mase),
        ]
    }
}

impl std::fmt::Display for PointMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Point Forecast Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  SMAPE: {:.4}", self.smape)?;
        writeln!(f, "  MASE:  {:.4}", self.mase)?;
        Ok(())
    }
}
