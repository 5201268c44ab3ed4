//! Walk-forward backtesting
//!
//! Windows are processed strictly in order: a later window's fit may depend
//! on state an earlier window left in the model. Any model or validation
//! failure aborts the whole run.

use crate::config::WalkForwardConfig;
use crate::data::{TimeSeriesDataset, WalkForwardWindow};
use crate::error::Result;
use crate::models::{ForecastRequest, Model};
use crate::record::Recorder;
use crate::validation::validate_forecast_result;
use chrono::SecondsFormat;
use eval_math::PointMetrics;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// Event type recorded for every scored window
pub const WINDOW_EVENT: &str = "walk_forward_window";

/// Outcome of one backtest window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// `<zero-padded window index>-<as-of date>`
    pub sample_id: String,
    pub window_index: usize,
    /// Timestamp of the last training point, RFC 3339
    pub as_of: String,
    pub forecast: Vec<f64>,
    pub actual: Vec<f64>,
    pub metrics: PointMetrics,
}

/// Drives a model through the walk-forward windows of a dataset
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkForwardBacktester;

impl WalkForwardBacktester {
    pub fn new() -> Self {
        Self
    }

    /// Run the backtest, returning one result per window in window order
    pub fn run(
        &self,
        dataset: &TimeSeriesDataset,
        model: &mut dyn Model,
        config: &WalkForwardConfig,
        recorder: &dyn Recorder,
    ) -> Result<Vec<BacktestResult>> {
        config.validate()?;
        info!(
            model = model.name(),
            points = dataset.len(),
            horizon = config.horizon,
            step = config.step,
            "starting walk-forward backtest"
        );

        let windows = dataset.walk_forward_windows(
            config.horizon,
            config.step,
            config.min_train_size,
            config.max_train_size,
            config.max_windows,
        )?;

        model.reset()?;
        let mut trained_once = false;
        let mut results = Vec::new();

        for window in windows {
            let request = ForecastRequest::from(&window);

            let retrain = should_retrain(&window, config, trained_once);
            if retrain {
                model.fit(&request)?;
                trained_once = true;
            }

            let forecast = model.predict(&request)?;
            let context = format!("backtest window {}", window.window_index);
            validate_forecast_result(&forecast, config.horizon, &context)?;

            let metrics =
                PointMetrics::compute(&window.future, &forecast.point_forecast, &window.history)?;
            if metrics.mase.is_nan() {
                warn!(
                    window = window.window_index,
                    "MASE undefined: history shorter than 2 points"
                );
            }

            let sample_id = format!("{:05}-{}", window.window_index, window.as_of.date_naive());
            let result = BacktestResult {
                sample_id,
                window_index: window.window_index,
                as_of: window.as_of.to_rfc3339_opts(SecondsFormat::Secs, true),
                forecast: forecast.point_forecast,
                actual: window.future,
                metrics,
            };
            debug!(
                sample_id = %result.sample_id,
                retrained = retrain,
                mae = result.metrics.mae,
                "scored window"
            );

            recorder.record_event(
                WINDOW_EVENT,
                json!({
                    "sample_id": result.sample_id,
                    "as_of": result.as_of,
                    "forecast": result.forecast,
                    "actual": result.actual,
                    "metrics": result.metrics,
                }),
                &result.sample_id,
            )?;
            results.push(result);
        }

        info!(windows = results.len(), "walk-forward backtest finished");
        Ok(results)
    }
}

/// Retraining cadence. `allow_retrain` gates `retrain_frequency`: with
/// retraining disabled only the first window processed is fitted.
fn should_retrain(
    window: &WalkForwardWindow,
    config: &WalkForwardConfig,
    trained_once: bool,
) -> bool {
    if !config.allow_retrain {
        return !trained_once;
    }
    window.window_index % config.retrain_frequency.max(1) == 0
}
