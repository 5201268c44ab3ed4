//! Moving average baseline

use crate::error::{EvalError, Result};
use crate::models::{ForecastRequest, ForecastResult, Model};

/// Simple Moving Average model
///
/// Forecasts the mean of the last `window` observations, flat across the
/// horizon. Histories shorter than the window are averaged whole.
#[derive(Debug, Clone)]
pub struct MovingAverageModel {
    /// Name of the model
    name: String,
    /// Window size
    window: usize,
}

impl MovingAverageModel {
    /// Create a new Simple Moving Average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(EvalError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Simple Moving Average (window={})", window),
            window,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Model for MovingAverageModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        if request.history.is_empty() {
            return Err(EvalError::Model(
                "Moving average needs at least one observation".to_string(),
            ));
        }

        let start = request.history.len().saturating_sub(self.window);
        let recent = &request.history[start..];
        let average = recent.iter().sum::<f64>() / recent.len() as f64;

        Ok(ForecastResult::point(vec![average; request.horizon]))
    }
}
