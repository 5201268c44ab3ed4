use approx::assert_relative_eq;
use eval_math::probabilistic::{crps, rcrps, rcrps_over_horizon, RegionOfInterest};

#[test]
fn test_rcrps_inside_region_is_non_negative() {
    let samples = [1.0, 2.0, 3.0];
    let score = rcrps(&samples, 2.0, Some(RegionOfInterest::new(0.0, 4.0)), 1.0).unwrap();

    assert!(score.is_finite());
    assert!(score >= 0.0);
    assert_relative_eq!(score, crps(&samples, 2.0).unwrap());
    assert_relative_eq!(score, 2.0 / 9.0, epsilon = 1e-12);
}

#[test]
fn test_rcrps_penalizes_target_above_region() {
    let samples = [1.0, 2.0, 3.0];
    let base = crps(&samples, 5.0).unwrap();
    let score = rcrps(&samples, 5.0, Some((0.0, 4.0).into()), 2.0).unwrap();

    assert_relative_eq!(score, base + 2.0 * 1.0);
    assert_relative_eq!(base, 3.0 - 4.0 / 9.0, epsilon = 1e-12);
}

#[test]
fn test_rcrps_penalizes_target_below_region() {
    let samples = [1.0];
    let score = rcrps(&samples, -2.0, Some(RegionOfInterest::new(0.0, 4.0)), 1.0).unwrap();
    assert_relative_eq!(score, 3.0 + 2.0);
}

#[test]
fn test_rcrps_without_region_is_crps() {
    let samples = [0.5, 1.5];
    assert_relative_eq!(
        rcrps(&samples, 10.0, None, 5.0).unwrap(),
        crps(&samples, 10.0).unwrap()
    );
}

#[test]
fn test_crps_rejects_empty_sample_set() {
    assert!(crps(&[], 1.0).is_err());
}

#[test]
fn test_rcrps_over_horizon_averages_steps() {
    let sets = vec![vec![1.0], vec![4.0]];
    let targets = [2.0, 4.0];
    let score = rcrps_over_horizon(&sets, &targets, None, 1.0).unwrap();
    assert_relative_eq!(score, 0.5);

    assert!(rcrps_over_horizon(&sets, &[1.0], None, 1.0).is_err());
    assert!(rcrps_over_horizon(&[], &[], None, 1.0).is_err());
}
