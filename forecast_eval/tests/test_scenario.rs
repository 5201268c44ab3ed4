use approx::assert_relative_eq;
use forecast_eval::loaders::SyntheticScenarioLoader;
use forecast_eval::models::LastValueModel;
use forecast_eval::scenario::SCENARIO_EVENT;
use forecast_eval::{
    EvalError, ForecastRequest, ForecastResult, MemoryRecorder, Model, NullRecorder, Result,
    Samples, ScenarioEvaluator, ScenarioSample,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

/// Emits two sample paths, one below and one above the truth of 2.0
#[derive(Debug, Default)]
struct TwoPathModel {
    resets: usize,
    predictions: usize,
}

impl Model for TwoPathModel {
    fn name(&self) -> &str {
        "two paths"
    }

    fn reset(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        self.predictions += 1;
        let h = request.horizon;
        Ok(ForecastResult::point(vec![2.0; h])
            .with_samples(Samples::Paths(vec![vec![1.0; h], vec![3.0; h]])))
    }
}

/// Keeps every request it is asked to forecast
#[derive(Debug, Default)]
struct CapturingModel {
    requests: Vec<ForecastRequest>,
}

impl Model for CapturingModel {
    fn name(&self) -> &str {
        "capturing"
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        self.requests.push(request.clone());
        Ok(ForecastResult::point(vec![0.0; request.horizon]))
    }
}

/// Quantile bands one step shorter than the horizon
#[derive(Debug)]
struct BadQuantileModel;

impl Model for BadQuantileModel {
    fn name(&self) -> &str {
        "bad quantiles"
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        let h = request.horizon;
        let quantiles = BTreeMap::from([
            ("0.1".to_string(), vec![0.0; h]),
            ("0.9".to_string(), vec![1.0; h - 1]),
        ]);
        Ok(ForecastResult::point(vec![0.5; h]).with_quantiles(quantiles))
    }
}

#[test]
fn test_synthetic_sample_scored_with_point_forecast() {
    let samples = SyntheticScenarioLoader.load();
    let results = ScenarioEvaluator::new()
        .run(&samples, &mut LastValueModel::new(), &NullRecorder)
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].sample_id, "synthetic-0");
    assert_eq!(results[0].forecast, vec![3.0, 3.0]);
    assert_eq!(results[0].actual, vec![3.5, 3.7]);
    assert_relative_eq!(results[0].metric, 0.6, epsilon = 1e-12);
}

#[test]
fn test_request_carries_context_and_metadata() {
    let metadata = BTreeMap::from([("region".to_string(), serde_json::json!("north"))]);
    let samples = vec![
        ScenarioSample::new("storm", vec![4.0, 5.0, 6.0], vec![1.0, 1.0])
            .with_context("A storm closes the port on day two.")
            .with_metadata(metadata.clone()),
        ScenarioSample::new("plain", vec![1.0], vec![1.0]),
    ];
    let mut model = CapturingModel::default();

    ScenarioEvaluator::new()
        .run(&samples, &mut model, &NullRecorder)
        .unwrap();

    assert_eq!(model.requests.len(), 2);
    let storm = &model.requests[0];
    assert_eq!(storm.history, vec![4.0, 5.0, 6.0]);
    assert_eq!(storm.horizon, 2);
    assert_eq!(storm.context_text.as_deref(), Some("A storm closes the port on day two."));
    assert_eq!(storm.metadata, Some(metadata));

    let plain = &model.requests[1];
    assert_eq!(plain.horizon, 1);
    assert_eq!(plain.context_text, None);
    assert_eq!(plain.metadata, None);
}

#[test]
fn test_roi_penalty_scaled_by_weight() {
    let samples = vec![ScenarioSample::new("above", vec![11.0], vec![12.0]).with_roi(0.0, 10.0)];

    let unit = ScenarioEvaluator::new()
        .run(&samples, &mut LastValueModel::new(), &NullRecorder)
        .unwrap();
    assert_relative_eq!(unit[0].metric, 3.0, epsilon = 1e-12);

    let doubled = ScenarioEvaluator::with_penalty_weight(2.0)
        .run(&samples, &mut LastValueModel::new(), &NullRecorder)
        .unwrap();
    assert_relative_eq!(doubled[0].metric, 5.0, epsilon = 1e-12);
}

#[test]
fn test_sample_paths_use_spread_term() {
    let samples = vec![
        ScenarioSample::new("a", vec![1.0, 2.0], vec![2.0, 2.0]),
        ScenarioSample::new("b", vec![5.0], vec![2.0]),
        ScenarioSample::new("c", vec![], vec![2.0, 2.0, 2.0]),
    ];
    let mut model = TwoPathModel::default();

    let results = ScenarioEvaluator::new()
        .run(&samples, &mut model, &NullRecorder)
        .unwrap();

    for result in &results {
        assert_relative_eq!(result.metric, 0.5, epsilon = 1e-12);
    }
    assert_eq!(model.resets, 1);
    assert_eq!(model.predictions, 3);
}

#[test]
fn test_bad_quantiles_abort_with_sample_context() {
    let samples = vec![ScenarioSample::new("q-1", vec![1.0, 2.0], vec![3.0, 4.0])];
    let recorder = MemoryRecorder::new();

    let err = ScenarioEvaluator::new()
        .run(&samples, &mut BadQuantileModel, &recorder)
        .unwrap_err();

    match err {
        EvalError::LengthMismatch {
            context,
            what,
            actual,
            expected,
        } => {
            assert_eq!(context, "scenario sample q-1");
            assert_eq!(what, "quantile 0.9");
            assert_eq!(actual, 1);
            assert_eq!(expected, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(recorder.events().is_empty());
}

#[test]
fn test_events_recorded_per_sample() {
    let samples = vec![
        ScenarioSample::new("s0", vec![1.0], vec![1.0]),
        ScenarioSample::new("s1", vec![1.0], vec![3.0]),
    ];
    let recorder = MemoryRecorder::new();

    ScenarioEvaluator::new()
        .run(&samples, &mut LastValueModel::new(), &recorder)
        .unwrap();
    let events = recorder.events();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, SCENARIO_EVENT);
    assert_eq!(events[1].sample_id, "s1");
    assert_eq!(events[1].payload["rcrps"], serde_json::json!(2.0));
    assert!(events[0].timestamp.ends_with('Z'));
}

#[test]
fn test_empty_sample_list() {
    let mut model = TwoPathModel::default();
    let results = ScenarioEvaluator::new()
        .run(&[], &mut model, &NullRecorder)
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(model.resets, 1);
}
