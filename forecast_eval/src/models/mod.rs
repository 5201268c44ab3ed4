//! Forecasting model capability and built-in baselines
//!
//! The evaluation engines only see the [`Model`] trait: `reset`, `fit` and
//! `predict`. `reset` and `fit` default to no-ops so stateless forecasters
//! only implement `predict`.

use crate::data::{FeatureSeries, Metadata, ScenarioSample, WalkForwardWindow};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// What a model is asked to forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub history: Vec<f64>,
    /// Number of steps the forecast must cover
    pub horizon: usize,
    #[serde(default)]
    pub timestamps: Option<Vec<DateTime<Utc>>>,
    #[serde(default)]
    pub features: Option<FeatureSeries>,
    #[serde(default)]
    pub context_text: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl ForecastRequest {
    pub fn new(history: Vec<f64>, horizon: usize) -> Self {
        Self {
            history,
            horizon,
            timestamps: None,
            features: None,
            context_text: None,
            metadata: None,
        }
    }

    pub fn with_timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    pub fn with_features(mut self, features: FeatureSeries) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_context(mut self, context_text: Option<String>) -> Self {
        self.context_text = context_text;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Metadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Last observed value, if any
    pub fn last_value(&self) -> Option<f64> {
        self.history.last().copied()
    }
}

/// History, timestamps and features of a window; the horizon is the length
/// of its future segment
impl From<&WalkForwardWindow> for ForecastRequest {
    fn from(window: &WalkForwardWindow) -> Self {
        ForecastRequest::new(window.history.clone(), window.future.len())
            .with_timestamps(window.history_timestamps.clone())
            .with_features(window.history_features.clone())
    }
}

impl From<&ScenarioSample> for ForecastRequest {
    fn from(sample: &ScenarioSample) -> Self {
        ForecastRequest::new(sample.history.clone(), sample.future.len())
            .with_context(sample.context_text.clone())
            .with_metadata(sample.metadata.clone())
    }
}

/// Sample output of a probabilistic forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Samples {
    /// One sample per horizon step, i.e. a single sample path
    Flat(Vec<f64>),
    /// Rows are sample paths, each covering the whole horizon
    Paths(Vec<Vec<f64>>),
}

/// What a model returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub point_forecast: Vec<f64>,
    #[serde(default)]
    pub samples: Option<Samples>,
    /// Quantile label (e.g. `"0.1"`) to a series covering the horizon
    #[serde(default)]
    pub quantiles: Option<BTreeMap<String, Vec<f64>>>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl ForecastResult {
    /// A point-only forecast
    pub fn point(point_forecast: Vec<f64>) -> Self {
        Self {
            point_forecast,
            samples: None,
            quantiles: None,
            metadata: None,
        }
    }

    pub fn with_samples(mut self, samples: Samples) -> Self {
        self.samples = Some(samples);
        self
    }

    pub fn with_quantiles(mut self, quantiles: BTreeMap<String, Vec<f64>>) -> Self {
        self.quantiles = Some(quantiles);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Forecasting capability consumed by the evaluation engines
pub trait Model: Debug + Send {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Clear any trained state. Must be idempotent.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Train on the request's history. No-op unless overridden.
    fn fit(&mut self, _request: &ForecastRequest) -> Result<()> {
        Ok(())
    }

    /// Produce a forecast covering `request.horizon` steps
    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult>;
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn fit(&mut self, request: &ForecastRequest) -> Result<()> {
        (**self).fit(request)
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        (**self).predict(request)
    }
}

/// Population standard deviation of the first differences of `history`.
///
/// Zero when there are fewer than two differences to measure.
pub(crate) fn difference_std_dev(history: &[f64]) -> f64 {
    if history.len() < 3 {
        return 0.0;
    }
    let diffs: Vec<f64> = history.windows(2).map(|w| w[1] - w[0]).collect();
    let sigma = diffs.iter().population_std_dev();
    if sigma.is_finite() {
        sigma
    } else {
        0.0
    }
}

pub mod exponential_smoothing;
pub mod moving_average;
pub mod naive;
pub mod quantile;
pub mod random_walk;

pub use exponential_smoothing::ExponentialSmoothingModel;
pub use moving_average::MovingAverageModel;
pub use naive::LastValueModel;
pub use quantile::QuantileNaiveModel;
pub use random_walk::RandomWalkModel;
