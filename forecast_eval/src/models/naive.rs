//! Naive persistence baseline

use crate::error::Result;
use crate::models::{ForecastRequest, ForecastResult, Model};

/// Repeats the last observed value across the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct LastValueModel {
    /// Forecast used when the history is empty
    fallback_value: f64,
}

impl LastValueModel {
    pub fn new() -> Self {
        Self::with_fallback(0.0)
    }

    pub fn with_fallback(fallback_value: f64) -> Self {
        Self { fallback_value }
    }
}

impl Default for LastValueModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for LastValueModel {
    fn name(&self) -> &str {
        "Last Value"
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        let value = request.last_value().unwrap_or(self.fallback_value);
        Ok(ForecastResult::point(vec![value; request.horizon]))
    }
}
