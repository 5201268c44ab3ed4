//! Exponential smoothing baseline

use crate::error::{EvalError, Result};
use crate::models::{ForecastRequest, ForecastResult, Model};

/// Simple exponential smoothing model
///
/// `fit` smooths the training history into a level that later predictions
/// reuse until the next `fit` or `reset`. Without a fitted level, `predict`
/// smooths the request history itself.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothingModel {
    /// Name of the model
    name: String,
    /// Smoothing parameter
    alpha: f64,
    /// Level from the last fit
    level: Option<f64>,
}

impl ExponentialSmoothingModel {
    /// Create a new exponential smoothing model
    pub fn new(alpha: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(EvalError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Exponential Smoothing (alpha={})", alpha),
            alpha,
            level: None,
        })
    }

    /// Level learned by the last `fit`, if any
    pub fn fitted_level(&self) -> Option<f64> {
        self.level
    }

    fn smooth(&self, history: &[f64]) -> Result<f64> {
        let (&first, rest) = history.split_first().ok_or_else(|| {
            EvalError::Model("Empty history for exponential smoothing".to_string())
        })?;

        // Initialize level with first observation
        let mut level = first;
        for &value in rest {
            level = self.alpha * value + (1.0 - self.alpha) * level;
        }
        Ok(level)
    }
}

impl Model for ExponentialSmoothingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) -> Result<()> {
        self.level = None;
        Ok(())
    }

    fn fit(&mut self, request: &ForecastRequest) -> Result<()> {
        self.level = Some(self.smooth(&request.history)?);
        Ok(())
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        let level = match self.level {
            Some(level) => level,
            None => self.smooth(&request.history)?,
        };

        // Forecast is flat at the current level
        Ok(ForecastResult::point(vec![level; request.horizon]))
    }
}
