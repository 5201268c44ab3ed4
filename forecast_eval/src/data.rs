//! Time series and scenario data handling for evaluation
//!
//! A [`TimeSeriesDataset`] is always sorted by timestamp. Walk-forward
//! windows are produced lazily from it and never mutate it.

use crate::error::{EvalError, Result};
use chrono::{DateTime, Utc};
use eval_math::RegionOfInterest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form metadata attached to datasets, samples, requests and results
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Named feature channels, each a series aligned with the values
pub type FeatureSeries = BTreeMap<String, Vec<f64>>;

/// A single timestamped observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(default)]
    pub features: Option<BTreeMap<String, f64>>,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            features: None,
        }
    }

    pub fn with_features(mut self, features: BTreeMap<String, f64>) -> Self {
        self.features = Some(features);
        self
    }
}

/// History visible at a given moment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AsOfSlice {
    pub history: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub features: FeatureSeries,
}

/// One train/test split along the time axis
#[derive(Debug, Clone, PartialEq)]
pub struct WalkForwardWindow {
    /// Timestamp of the last history point
    pub as_of: DateTime<Utc>,
    pub history: Vec<f64>,
    pub history_timestamps: Vec<DateTime<Utc>>,
    pub history_features: FeatureSeries,
    pub future: Vec<f64>,
    pub future_timestamps: Vec<DateTime<Utc>>,
    pub future_features: FeatureSeries,
    /// Zero-based position in the window sequence
    pub window_index: usize,
}

/// Ordered sequence of observations
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesDataset {
    points: Vec<TimeSeriesPoint>,
    frequency: Option<String>,
    metadata: Metadata,
}

impl TimeSeriesDataset {
    /// Create a dataset, sorting points by timestamp.
    ///
    /// The sort is stable: points sharing a timestamp keep their input order.
    pub fn new(mut points: Vec<TimeSeriesPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            points,
            frequency: None,
            metadata: Metadata::new(),
        }
    }

    /// Create a dataset from parallel timestamp and value vectors
    pub fn from_values(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(EvalError::Data(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }

        let points = timestamps
            .into_iter()
            .zip(values)
            .map(|(timestamp, value)| TimeSeriesPoint::new(timestamp, value))
            .collect();
        Ok(Self::new(points))
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn frequency(&self) -> Option<&str> {
        self.frequency.as_deref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observed values in timestamp order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Everything observed at or before `timestamp`
    pub fn as_of(&self, timestamp: DateTime<Utc>) -> AsOfSlice {
        let end = self.points.partition_point(|p| p.timestamp <= timestamp);
        let visible = &self.points[..end];

        AsOfSlice {
            history: visible.iter().map(|p| p.value).collect(),
            timestamps: visible.iter().map(|p| p.timestamp).collect(),
            features: collect_feature_series(visible),
        }
    }

    /// Lazily generate walk-forward windows.
    ///
    /// Window `i` trains on `points[..min_train_size + i * step]` (keeping
    /// only the last `max_train_size` points when set) and tests on the
    /// following `horizon` points. Future segments overlap when
    /// `step < horizon`.
    pub fn walk_forward_windows(
        &self,
        horizon: usize,
        step: usize,
        min_train_size: usize,
        max_train_size: Option<usize>,
        max_windows: Option<usize>,
    ) -> Result<WalkForwardWindows<'_>> {
        if horizon == 0 || step == 0 || min_train_size == 0 {
            return Err(EvalError::InvalidParameter(format!(
                "horizon ({}), step ({}) and min_train_size ({}) must all be at least 1",
                horizon, step, min_train_size
            )));
        }

        Ok(WalkForwardWindows {
            points: &self.points,
            horizon,
            step,
            max_train_size,
            max_windows,
            cutoff: min_train_size,
            window_index: 0,
        })
    }
}

/// Iterator over the walk-forward windows of a dataset
#[derive(Debug, Clone)]
pub struct WalkForwardWindows<'a> {
    points: &'a [TimeSeriesPoint],
    horizon: usize,
    step: usize,
    max_train_size: Option<usize>,
    max_windows: Option<usize>,
    cutoff: usize,
    window_index: usize,
}

impl Iterator for WalkForwardWindows<'_> {
    type Item = WalkForwardWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.max_windows.is_some_and(|max| self.window_index >= max) {
            return None;
        }
        let end = self.cutoff.checked_add(self.horizon)?;
        if end > self.points.len() {
            return None;
        }

        let start = self
            .max_train_size
            .map_or(0, |max| self.cutoff.saturating_sub(max));
        let history = &self.points[start..self.cutoff];
        let future = &self.points[self.cutoff..end];
        let as_of = history.last()?.timestamp;
        if future.is_empty() {
            return None;
        }

        let window = WalkForwardWindow {
            as_of,
            history: history.iter().map(|p| p.value).collect(),
            history_timestamps: history.iter().map(|p| p.timestamp).collect(),
            history_features: collect_feature_series(history),
            future: future.iter().map(|p| p.value).collect(),
            future_timestamps: future.iter().map(|p| p.timestamp).collect(),
            future_features: collect_feature_series(future),
            window_index: self.window_index,
        };

        self.window_index += 1;
        // an overflowing cutoff is past any dataset, so the sequence ends
        self.cutoff = self.cutoff.checked_add(self.step).unwrap_or(usize::MAX);
        Some(window)
    }
}

/// A self-contained forecasting scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSample {
    #[serde(default)]
    pub sample_id: String,
    pub history: Vec<f64>,
    pub future: Vec<f64>,
    #[serde(default, alias = "context")]
    pub context_text: Option<String>,
    /// `(lower, upper)` bounds of the plausible range
    #[serde(default)]
    pub roi: Option<(f64, f64)>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl ScenarioSample {
    pub fn new(sample_id: impl Into<String>, history: Vec<f64>, future: Vec<f64>) -> Self {
        Self {
            sample_id: sample_id.into(),
            history,
            future,
            context_text: None,
            roi: None,
            metadata: None,
        }
    }

    pub fn with_context(mut self, context_text: impl Into<String>) -> Self {
        self.context_text = Some(context_text.into());
        self
    }

    pub fn with_roi(mut self, lower: f64, upper: f64) -> Self {
        self.roi = Some((lower, upper));
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn region_of_interest(&self) -> Option<RegionOfInterest> {
        self.roi.map(RegionOfInterest::from)
    }
}

/// Build lagged copies of a covariate for a training window.
///
/// For each lag `k` in `1..=max_lag`, the entry `"<name>_lag<k>"` holds
/// `covariate[start - train_window - k .. start - k]`, so no lagged value
/// is taken from index `start` or later.
pub fn lagged_feature_windows(
    name: &str,
    covariate: &[f64],
    start: usize,
    train_window: usize,
    max_lag: usize,
) -> Result<FeatureSeries> {
    if start > covariate.len() {
        return Err(EvalError::Data(format!(
            "Window start {} is past the covariate length {}",
            start,
            covariate.len()
        )));
    }
    if start < train_window + max_lag {
        return Err(EvalError::Data(format!(
            "Window start {} leaves no room for {} training points and {} lags",
            start, train_window, max_lag
        )));
    }

    let mut lagged = FeatureSeries::new();
    for lag in 1..=max_lag {
        let from = start - train_window - lag;
        let to = start - lag;
        lagged.insert(format!("{}_lag{}", name, lag), covariate[from..to].to_vec());
    }
    Ok(lagged)
}

fn collect_feature_series(points: &[TimeSeriesPoint]) -> FeatureSeries {
    let mut features = FeatureSeries::new();
    for point in points {
        let Some(point_features) = &point.features else {
            continue;
        };
        for (name, value) in point_features {
            features.entry(name.clone()).or_default().push(*value);
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn feature_series_skip_points_without_features() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = vec![
            TimeSeriesPoint::new(t0, 1.0)
                .with_features(BTreeMap::from([("x".to_string(), 10.0)])),
            TimeSeriesPoint::new(t0, 2.0),
            TimeSeriesPoint::new(t0, 3.0)
                .with_features(BTreeMap::from([("x".to_string(), 30.0)])),
        ];

        let features = collect_feature_series(&points);
        assert_eq!(features.get("x"), Some(&vec![10.0, 30.0]));
    }
}
