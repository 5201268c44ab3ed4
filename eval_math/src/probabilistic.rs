//! Probabilistic scores over sample sets
//!
//! A sample set is the collection of values a forecaster proposes for a
//! single horizon step. Sample paths are transposed into per-step sample
//! sets before they reach these functions.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Declared plausible range for the true outcome.
///
/// Used only to penalize truths outside the range; forecasts are never
/// clipped to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub lower: f64,
    pub upper: f64,
}

impl RegionOfInterest {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Distance from `target` to the region, zero when inside.
    pub fn distance(&self, target: f64) -> f64 {
        (self.lower - target).max(target - self.upper).max(0.0)
    }
}

impl From<(f64, f64)> for RegionOfInterest {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self { lower, upper }
    }
}

/// Empirical Continuous Ranked Probability Score.
///
/// `mean(|s - t|) - 0.5 * mean(|s_i - s_j|)` where the second mean runs over
/// every ordered pair of samples, including `i == j`.
pub fn crps(samples: &[f64], target: f64) -> Result<f64> {
    if samples.is_empty() {
        return Err(MathError::InsufficientData(
            "CRPS needs at least one sample".to_string(),
        ));
    }

    let n = samples.len() as f64;
    let accuracy = samples.iter().map(|s| (s - target).abs()).sum::<f64>() / n;

    let mut spread = 0.0;
    for a in samples {
        for b in samples {
            spread += (a - b).abs();
        }
    }
    spread /= n * n;

    Ok(accuracy - 0.5 * spread)
}

/// Region-penalized CRPS.
///
/// Adds `penalty_weight * max(0, lower - target, target - upper)` to the
/// CRPS when a region of interest is declared.
pub fn rcrps(
    samples: &[f64],
    target: f64,
    roi: Option<RegionOfInterest>,
    penalty_weight: f64,
) -> Result<f64> {
    let base = crps(samples, target)?;
    Ok(match roi {
        Some(region) => base + penalty_weight * region.distance(target),
        None => base,
    })
}

/// Mean RCRPS across horizon steps.
///
/// `sample_sets[i]` holds the samples for step `i` and is scored against
/// `targets[i]`.
pub fn rcrps_over_horizon(
    sample_sets: &[Vec<f64>],
    targets: &[f64],
    roi: Option<RegionOfInterest>,
    penalty_weight: f64,
) -> Result<f64> {
    if targets.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot score an empty horizon".to_string(),
        ));
    }
    if sample_sets.len() != targets.len() {
        return Err(MathError::InvalidInput(format!(
            "Sample sets ({}) don't match targets ({})",
            sample_sets.len(),
            targets.len()
        )));
    }

    let mut total = 0.0;
    for (set, &target) in sample_sets.iter().zip(targets.iter()) {
        total += rcrps(set, target, roi, penalty_weight)?;
    }
    Ok(total / targets.len() as f64)
}
