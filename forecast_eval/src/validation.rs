//! Forecast result validation and normalization
//!
//! Every forecast is checked against the expected horizon before it is
//! scored. Scoring works on a [`ScoringMatrix`]: one row per horizon step,
//! holding every value the forecaster proposed for that step.

use crate::error::{EvalError, Result};
use crate::models::{ForecastResult, Samples};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Check a forecast against the expected horizon.
///
/// `context` names the window or sample being checked and is carried into
/// any error.
pub fn validate_forecast_result(
    result: &ForecastResult,
    horizon: usize,
    context: &str,
) -> Result<()> {
    if result.point_forecast.len() != horizon {
        return Err(EvalError::length(
            context,
            "point_forecast",
            result.point_forecast.len(),
            horizon,
        ));
    }
    if let Some(samples) = &result.samples {
        validate_samples(samples, horizon, context)?;
    }
    if let Some(quantiles) = &result.quantiles {
        validate_quantiles(quantiles, horizon, context)?;
    }
    Ok(())
}

fn validate_samples(samples: &Samples, horizon: usize, context: &str) -> Result<()> {
    match samples {
        Samples::Flat(values) => {
            if values.len() != horizon {
                return Err(EvalError::length(context, "samples", values.len(), horizon));
            }
        }
        Samples::Paths(paths) => {
            if paths.is_empty() {
                return Err(EvalError::contract(context, "samples is empty"));
            }
            for (idx, path) in paths.iter().enumerate() {
                if path.len() != horizon {
                    return Err(EvalError::length(
                        context,
                        format!("sample[{}]", idx),
                        path.len(),
                        horizon,
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_quantiles(
    quantiles: &BTreeMap<String, Vec<f64>>,
    horizon: usize,
    context: &str,
) -> Result<()> {
    if quantiles.is_empty() {
        return Err(EvalError::contract(context, "quantiles is empty"));
    }
    for (key, series) in quantiles {
        if series.len() != horizon {
            return Err(EvalError::length(
                context,
                format!("quantile {}", key),
                series.len(),
                horizon,
            ));
        }
    }
    Ok(())
}

/// Sample paths of a result, one row per path.
///
/// `None` when the result carries no samples. A flat sample list becomes a
/// single path.
pub fn normalize_samples(
    result: &ForecastResult,
    horizon: usize,
    context: &str,
) -> Result<Option<Vec<Vec<f64>>>> {
    let Some(samples) = &result.samples else {
        return Ok(None);
    };
    validate_samples(samples, horizon, context)?;

    Ok(Some(match samples {
        Samples::Flat(values) => vec![values.clone()],
        Samples::Paths(paths) => paths.clone(),
    }))
}

/// Per-step sample sets used for probabilistic scoring
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringMatrix {
    steps: Vec<Vec<f64>>,
}

impl ScoringMatrix {
    /// Normalize a validated result.
    ///
    /// Precedence: quantile bands when there are no samples, then the point
    /// forecast as a single-sample set per step when there are neither,
    /// otherwise the samples transposed so each row is one horizon step.
    pub fn from_result(result: &ForecastResult, horizon: usize, context: &str) -> Result<Self> {
        if result.samples.is_none() {
            if let Some(quantiles) = result.quantiles.as_ref().filter(|q| !q.is_empty()) {
                validate_quantiles(quantiles, horizon, context)?;
                let rows: Vec<&Vec<f64>> = sorted_quantile_keys(quantiles)
                    .into_iter()
                    .map(|key| &quantiles[key])
                    .collect();
                return Ok(Self {
                    steps: transpose(&rows, horizon),
                });
            }
            return Ok(Self {
                steps: result.point_forecast.iter().map(|&v| vec![v]).collect(),
            });
        }

        let paths = normalize_samples(result, horizon, context)?.unwrap_or_default();
        let rows: Vec<&Vec<f64>> = paths.iter().collect();
        Ok(Self {
            steps: transpose(&rows, horizon),
        })
    }

    /// Sample sets, indexed by horizon step
    pub fn steps(&self) -> &[Vec<f64>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_inner(self) -> Vec<Vec<f64>> {
        self.steps
    }
}

/// Quantile labels in scoring order.
///
/// Labels that parse as numbers come first, ascending by value; the rest
/// follow in lexical order.
pub fn sorted_quantile_keys(quantiles: &BTreeMap<String, Vec<f64>>) -> Vec<&str> {
    let mut keys: Vec<&str> = quantiles.keys().map(String::as_str).collect();
    keys.sort_by(|a, b| compare_quantile_keys(a, b));
    keys
}

fn compare_quantile_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn transpose(rows: &[&Vec<f64>], horizon: usize) -> Vec<Vec<f64>> {
    (0..horizon)
        .map(|step| rows.iter().map(|row| row[step]).collect())
        .collect()
}
