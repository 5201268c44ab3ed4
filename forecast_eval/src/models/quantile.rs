//! Naive forecaster reporting quantile bands

use crate::error::{EvalError, Result};
use crate::models::{difference_std_dev, ForecastRequest, ForecastResult, Model};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;

/// Persistence forecast with Gaussian quantile bands.
///
/// Each level `q` is reported under the key `q.to_string()` as
/// `last + z(q) * sigma * sqrt(h)` for step `h` (1-based), where `sigma` is
/// the standard deviation of the history's first differences.
#[derive(Debug, Clone)]
pub struct QuantileNaiveModel {
    name: String,
    levels: Vec<f64>,
}

impl QuantileNaiveModel {
    pub fn new(levels: Vec<f64>) -> Result<Self> {
        if levels.is_empty() {
            return Err(EvalError::InvalidParameter(
                "At least one quantile level is required".to_string(),
            ));
        }
        if let Some(bad) = levels.iter().find(|&&q| q <= 0.0 || q >= 1.0) {
            return Err(EvalError::InvalidParameter(format!(
                "Quantile level {} must be between 0 and 1",
                bad
            )));
        }

        Ok(Self {
            name: format!("Quantile Naive ({} levels)", levels.len()),
            levels,
        })
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }
}

impl Default for QuantileNaiveModel {
    fn default() -> Self {
        Self {
            name: "Quantile Naive (3 levels)".to_string(),
            levels: vec![0.1, 0.5, 0.9],
        }
    }
}

impl Model for QuantileNaiveModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        let last = request
            .last_value()
            .ok_or_else(|| EvalError::Model("Quantile naive needs a history".to_string()))?;
        let sigma = difference_std_dev(&request.history);
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| EvalError::Model(format!("Invalid normal distribution: {}", e)))?;

        let mut quantiles = BTreeMap::new();
        for &level in &self.levels {
            let z = normal.inverse_cdf(level);
            let series = (1..=request.horizon)
                .map(|h| last + z * sigma * (h as f64).sqrt())
                .collect();
            quantiles.insert(level.to_string(), series);
        }

        Ok(ForecastResult::point(vec![last; request.horizon]).with_quantiles(quantiles))
    }
}
