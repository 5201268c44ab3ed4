use approx::assert_relative_eq;
use eval_math::point::{mae, mase, mse, rmse, smape, PointMetrics};
use eval_math::MathError;
use rstest::rstest;

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    assert_relative_eq!(mae(&actual, &predicted).unwrap(), 2.4);
    assert_relative_eq!(mse(&actual, &predicted).unwrap(), 6.0);
    assert_relative_eq!(rmse(&actual, &predicted).unwrap(), 6.0_f64.sqrt());

    let smape = smape(&actual, &predicted).unwrap();
    assert!(smape > 0.0 && smape < 0.15);
}

#[test]
fn test_smape_zero_over_zero_is_zero() {
    assert_eq!(smape(&[0.0], &[0.0]).unwrap(), 0.0);
    // The substituted denominator only applies to the all-zero position.
    assert_relative_eq!(smape(&[0.0, 1.0], &[0.0, 3.0]).unwrap(), 0.5);
}

#[rstest]
#[case(vec![])]
#[case(vec![7.0])]
fn test_mase_without_enough_history_is_nan(#[case] insample: Vec<f64>) {
    let result = mase(&[1.0, 2.0], &[1.5, 2.5], &insample).unwrap();
    assert!(result.is_nan());
}

#[test]
fn test_mase_scales_by_naive_error() {
    // Mean absolute first difference of the history is 2.0.
    let insample = [0.0, 2.0, 4.0, 6.0];
    let result = mase(&[8.0, 10.0], &[7.0, 9.0], &insample).unwrap();
    assert_relative_eq!(result, 0.5);
}

#[test]
fn test_mase_flat_history_uses_unit_scale() {
    let result = mase(&[5.0], &[3.0], &[1.0, 1.0, 1.0]).unwrap();
    assert_relative_eq!(result, 2.0);
}

#[rstest]
#[case(vec![], vec![])]
#[case(vec![1.0, 2.0, 3.0], vec![1.0, 2.0])]
fn test_shape_errors(#[case] actual: Vec<f64>, #[case] predicted: Vec<f64>) {
    assert!(mae(&actual, &predicted).is_err());
    assert!(rmse(&actual, &predicted).is_err());
    assert!(smape(&actual, &predicted).is_err());
    assert!(mase(&actual, &predicted, &[1.0, 2.0]).is_err());
}

#[test]
fn test_mismatch_names_both_lengths() {
    let err = mae(&[1.0, 2.0, 3.0], &[1.0]).unwrap_err();
    match err {
        MathError::InvalidInput(msg) => {
            assert!(msg.contains('3'));
            assert!(msg.contains('1'));
        }
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_point_metrics_bundle() {
    let metrics =
        PointMetrics::compute(&[5.0, 6.0], &[4.0, 4.0], &[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();

    assert_relative_eq!(metrics.mae, 1.5);
    assert_relative_eq!(metrics.rmse, 2.5_f64.sqrt());
    assert_relative_eq!(metrics.mase, 1.5);

    let names: Vec<&str> = metrics.named().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["mae", "rmse", "smape", "mase"]);

    let rendered = metrics.to_string();
    assert!(rendered.contains("MAE:   1.5000"));
}

#[test]
fn test_undefined_mase_survives_json() {
    let metrics = PointMetrics::compute(&[2.0], &[1.0], &[1.0]).unwrap();
    assert!(metrics.mase.is_nan());

    let json = serde_json::to_string(&metrics).unwrap();
    assert!(json.contains("\"mase\":null"));

    let restored: PointMetrics = serde_json::from_str(&json).unwrap();
    assert_relative_eq!(restored.mae, 1.0);
    assert!(restored.mase.is_nan());
}
