//! Scenario evaluation with RCRPS
//!
//! Each scenario sample carries its own history, future and optional
//! context and region of interest. The model is reset once per run, not per
//! sample, so samples processed in sequence share whatever state the model
//! keeps between predictions.

use crate::data::ScenarioSample;
use crate::error::{EvalError, Result};
use crate::models::{ForecastRequest, Model};
use crate::record::Recorder;
use crate::validation::{validate_forecast_result, ScoringMatrix};
use eval_math::rcrps_over_horizon;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Event type recorded for every scored sample
pub const SCENARIO_EVENT: &str = "scenario_result";

/// Outcome of one scenario sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub sample_id: String,
    pub forecast: Vec<f64>,
    pub actual: Vec<f64>,
    /// Mean RCRPS across the horizon
    pub metric: f64,
}

/// Drives a model through independent scenario samples
#[derive(Debug, Clone, Copy)]
pub struct ScenarioEvaluator {
    penalty_weight: f64,
}

impl Default for ScenarioEvaluator {
    fn default() -> Self {
        Self {
            penalty_weight: 1.0,
        }
    }
}

impl ScenarioEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight applied to the region-of-interest penalty
    pub fn with_penalty_weight(penalty_weight: f64) -> Self {
        Self { penalty_weight }
    }

    /// Score every sample in input order
    pub fn run(
        &self,
        samples: &[ScenarioSample],
        model: &mut dyn Model,
        recorder: &dyn Recorder,
    ) -> Result<Vec<ScenarioResult>> {
        info!(model = model.name(), samples = samples.len(), "starting scenario evaluation");

        model.reset()?;
        let mut results = Vec::with_capacity(samples.len());

        for sample in samples {
            let horizon = sample.future.len();
            let request = ForecastRequest::from(sample);

            let forecast = model.predict(&request)?;
            let context = format!("scenario sample {}", sample.sample_id);
            validate_forecast_result(&forecast, horizon, &context)?;

            let matrix = ScoringMatrix::from_result(&forecast, horizon, &context)?;
            if matrix.is_empty() {
                return Err(EvalError::contract(&context, "no samples available for RCRPS scoring"));
            }
            if let Some(step) = matrix.steps().iter().position(|set| set.is_empty()) {
                return Err(EvalError::contract(
                    &context,
                    format!("empty sample set at horizon index {}", step),
                ));
            }

            let metric = rcrps_over_horizon(
                matrix.steps(),
                &sample.future,
                sample.region_of_interest(),
                self.penalty_weight,
            )?;
            debug!(sample_id = %sample.sample_id, rcrps = metric, "scored scenario sample");

            recorder.record_event(
                SCENARIO_EVENT,
                json!({ "sample_id": sample.sample_id, "rcrps": metric }),
                &sample.sample_id,
            )?;
            results.push(ScenarioResult {
                sample_id: sample.sample_id.clone(),
                forecast: forecast.point_forecast,
                actual: sample.future.clone(),
                metric,
            });
        }

        info!(samples = results.len(), "scenario evaluation finished");
        Ok(results)
    }
}
