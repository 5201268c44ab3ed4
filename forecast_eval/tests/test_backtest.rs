use chrono::{DateTime, Duration, TimeZone, Utc};
use forecast_eval::backtest::WINDOW_EVENT;
use forecast_eval::models::LastValueModel;
use forecast_eval::{
    EvalError, ForecastRequest, ForecastResult, MemoryRecorder, Model, NullRecorder, Result,
    TimeSeriesDataset, TimeSeriesPoint, WalkForwardBacktester, WalkForwardConfig,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::BTreeMap;

fn day(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset)
}

fn daily_series(len: usize) -> TimeSeriesDataset {
    let timestamps = (0..len as i64).map(day).collect();
    let values = (0..len).map(|v| v as f64).collect();
    TimeSeriesDataset::from_values(timestamps, values).unwrap()
}

/// Counts lifecycle calls and forecasts the history length at every step
#[derive(Debug, Default)]
struct CountingModel {
    resets: usize,
    fitted_on: Vec<usize>,
}

impl Model for CountingModel {
    fn name(&self) -> &str {
        "counting"
    }

    fn reset(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }

    fn fit(&mut self, request: &ForecastRequest) -> Result<()> {
        self.fitted_on.push(request.history.len());
        Ok(())
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        Ok(ForecastResult::point(vec![
            request.history.len() as f64;
            request.horizon
        ]))
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

/// Returns one step too few
#[derive(Debug)]
struct ShortModel;

impl Model for ShortModel {
    fn name(&self) -> &str {
        "short"
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        Ok(ForecastResult::point(vec![0.0; request.horizon - 1]))
    }
}

#[test]
fn test_request_carries_history_timestamps_and_features() {
    let points = (0..8)
        .map(|i| {
            TimeSeriesPoint::new(day(i), i as f64)
                .with_features(BTreeMap::from([("temp".to_string(), 20.0 + i as f64)]))
        })
        .collect();
    let dataset = TimeSeriesDataset::new(points);
    let config = WalkForwardConfig::new(2).with_min_train_size(4).with_step(2);
    let mut model = CapturingModel::default();

    WalkForwardBacktester::new()
        .run(&dataset, &mut model, &config, &NullRecorder)
        .unwrap();

    assert_eq!(model.requests.len(), 2);
    let first = &model.requests[0];
    assert_eq!(first.history, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(first.horizon, 2);
    assert_eq!(first.timestamps, Some(vec![day(0), day(1), day(2), day(3)]));
    assert_eq!(first.features.as_ref().unwrap()["temp"], vec![20.0, 21.0, 22.0, 23.0]);

    let second = &model.requests[1];
    assert_eq!(second.timestamps.as_ref().unwrap().last(), Some(&day(5)));
    // nothing from the forecast period leaks into the request
    assert_eq!(second.features.as_ref().unwrap()["temp"].len(), 6);
    assert_eq!(second.context_text, None);
}

#[test]
fn test_last_value_backtest_end_to_end() {
    let dataset = daily_series(15);
    let config = WalkForwardConfig::new(2).with_min_train_size(5);
    let mut model = LastValueModel::new();

    let results = WalkForwardBacktester::new()
        .run(&dataset, &mut model, &config, &NullRecorder)
        .unwrap();

    assert_eq!(results.len(), 9);
    let indices: Vec<usize> = results.iter().map(|r| r.window_index).collect();
    assert_eq!(indices, (0..9).collect::<Vec<_>>());

    let first = &results[0];
    assert_eq!(first.forecast, vec![4.0, 4.0]);
    assert_eq!(first.actual, vec![5.0, 6.0]);
    assert_eq!(first.sample_id, "00000-2024-01-05");
    assert_eq!(first.as_of, "2024-01-05T00:00:00Z");
    assert!((first.metrics.mae - 1.5).abs() < 1e-12);
    // naive in-sample scale on a unit ramp is 1
    assert!((first.metrics.mase - 1.5).abs() < 1e-12);
}

#[test]
fn test_backtest_is_deterministic() {
    let dataset = daily_series(20);
    let config = WalkForwardConfig::new(3).with_min_train_size(6).with_step(2);
    let backtester = WalkForwardBacktester::new();

    let first = backtester
        .run(&dataset, &mut LastValueModel::new(), &config, &NullRecorder)
        .unwrap();
    let second = backtester
        .run(&dataset, &mut LastValueModel::new(), &config, &NullRecorder)
        .unwrap();
    assert_eq!(first, second);
}

#[rstest]
#[case(true, 1, vec![5, 6, 7, 8, 9, 10, 11])]
#[case(true, 3, vec![5, 8, 11])]
#[case(false, 1, vec![5])]
#[case(false, 3, vec![5])]
fn test_retrain_cadence(
    #[case] allow_retrain: bool,
    #[case] retrain_frequency: usize,
    #[case] expected_fits: Vec<usize>,
) {
    let dataset = daily_series(12);
    let config = WalkForwardConfig::new(1)
        .with_min_train_size(5)
        .with_retrain(allow_retrain, retrain_frequency);
    let mut model = CountingModel::default();

    let results = WalkForwardBacktester::new()
        .run(&dataset, &mut model, &config, &NullRecorder)
        .unwrap();

    assert_eq!(results.len(), 7);
    assert_eq!(model.resets, 1);
    assert_eq!(model.fitted_on, expected_fits);
}

#[test]
fn test_max_train_size_limits_requests() {
    let dataset = daily_series(12);
    let config = WalkForwardConfig::new(1)
        .with_min_train_size(5)
        .with_max_train_size(4);
    let mut model = CountingModel::default();

    let results = WalkForwardBacktester::new()
        .run(&dataset, &mut model, &config, &NullRecorder)
        .unwrap();

    assert!(model.fitted_on.iter().all(|&len| len == 4));
    assert!(results.iter().all(|r| r.forecast == vec![4.0]));
}

#[test]
fn test_validation_failure_aborts_run() {
    let dataset = daily_series(12);
    let config = WalkForwardConfig::new(2).with_min_train_size(5);
    let recorder = MemoryRecorder::new();

    let err = WalkForwardBacktester::new()
        .run(&dataset, &mut ShortModel, &config, &recorder)
        .unwrap_err();

    match err {
        EvalError::LengthMismatch {
            context,
            actual,
            expected,
            ..
        } => {
            assert_eq!(context, "backtest window 0");
            assert_eq!(actual, 1);
            assert_eq!(expected, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(recorder.events().is_empty());
}

#[test]
fn test_invalid_config_rejected_before_reset() {
    let dataset = daily_series(12);
    let config = WalkForwardConfig::new(0);
    let mut model = CountingModel::default();

    let result = WalkForwardBacktester::new().run(&dataset, &mut model, &config, &NullRecorder);
    assert!(matches!(result, Err(EvalError::InvalidParameter(_))));
    assert_eq!(model.resets, 0);
}

#[test]
fn test_short_series_yields_no_windows() {
    let dataset = daily_series(4);
    let config = WalkForwardConfig::new(1).with_min_train_size(5);
    let results = WalkForwardBacktester::new()
        .run(&dataset, &mut LastValueModel::new(), &config, &NullRecorder)
        .unwrap();
    assert!(results.is_empty());
}

#[rstest]
#[case(WalkForwardConfig::new(2).with_min_train_size(5).with_step(usize::MAX), 1)]
#[case(WalkForwardConfig::new(2).with_min_train_size(usize::MAX), 0)]
fn test_oversized_settings_end_the_run(#[case] config: WalkForwardConfig, #[case] windows: usize) {
    let results = WalkForwardBacktester::new()
        .run(&daily_series(15), &mut LastValueModel::new(), &config, &NullRecorder)
        .unwrap();
    assert_eq!(results.len(), windows);
}

#[test]
fn test_one_event_per_window() {
    let dataset = daily_series(10);
    let config = WalkForwardConfig::new(2).with_min_train_size(5);
    let recorder = MemoryRecorder::new();

    let results = WalkForwardBacktester::new()
        .run(&dataset, &mut LastValueModel::new(), &config, &recorder)
        .unwrap();
    let events = recorder.events();

    assert_eq!(events.len(), results.len());
    for (event, result) in events.iter().zip(&results) {
        assert_eq!(event.event_type, WINDOW_EVENT);
        assert_eq!(event.sample_id, result.sample_id);
        assert_eq!(event.payload["as_of"], result.as_of.as_str());
        assert_eq!(event.payload["forecast"], serde_json::json!(result.forecast));
        assert!(event.payload["metrics"]["mae"].is_number());
    }
}

#[test]
fn test_single_point_history_has_nan_mase() {
    let dataset = daily_series(3);
    let config = WalkForwardConfig::new(1).with_min_train_size(1);
    let results = WalkForwardBacktester::new()
        .run(&dataset, &mut LastValueModel::new(), &config, &NullRecorder)
        .unwrap();

    assert!(results[0].metrics.mase.is_nan());
    assert!(!results[1].metrics.mase.is_nan());
}
