use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use speed_detector_rs::{
    DisplayReading, EstimatorConfig, Sample, SpeedEstimator, SpeedIntegrator, SpeedUnit,
};

const STEP_NANOS: i64 = 20_000_000;

#[test]
fn stationary_phone_reads_zero() {
    let readings = Arc::new(Mutex::new(Vec::<DisplayReading>::new()));
    let sink_readings = Arc::clone(&readings);
    let mut estimator = SpeedEstimator::new()
        .with_unit(SpeedUnit::KilometersPerHour)
        .with_sink(move |r: &DisplayReading| sink_readings.lock().unwrap().push(r.clone()));

    for i in 0..100 {
        estimator
            .on_sample(&Sample::new(0.0, 0.0, 9.81, i * STEP_NANOS))
            .unwrap();
    }

    let readings = readings.lock().unwrap();
    assert_eq!(readings.len(), 100);
    let last = readings.last().unwrap();
    assert_eq!(last.formatted(), "0.0 km/h");
}

#[test]
fn push_then_rest_returns_to_zero() {
    let mut estimator = SpeedEstimator::new();
    let mut t = 0;

    // Settle on gravity first
    for _ in 0..50 {
        estimator.on_sample(&Sample::new(0.0, 0.0, 9.81, t)).unwrap();
        t += STEP_NANOS;
    }
    assert_eq!(estimator.speed(), 0.0);

    // Jerky forward push
    for i in 0..25 {
        let ax = if i % 2 == 0 { 6.0 } else { -6.0 };
        estimator.on_sample(&Sample::new(ax, 0.0, 9.81, t)).unwrap();
        t += STEP_NANOS;
    }
    let moving = estimator.speed();
    assert!(moving > 0.0);

    // Back to rest
    for _ in 0..100 {
        estimator.on_sample(&Sample::new(0.0, 0.0, 9.81, t)).unwrap();
        t += STEP_NANOS;
    }
    assert_eq!(estimator.speed(), 0.0);
}

#[test]
fn integrator_matches_reference_step() {
    let mut integrator = SpeedIntegrator::default();
    assert_relative_eq!(integrator.update(5.0, 1.0), 4.9, epsilon = 1e-12);
    assert_eq!(integrator.state().low_acceleration_streak, 0);
}

#[test]
fn stop_streak_from_nonzero_speed() {
    let config = EstimatorConfig::default();
    let mut integrator = SpeedIntegrator::new(&config).unwrap();
    integrator.update(10.0, 2.0);
    assert!(integrator.speed() > 0.0);

    for _ in 0..config.stop_detection_samples {
        integrator.update(0.0, 0.02);
    }
    assert_eq!(integrator.speed(), 0.0);
}

#[test]
fn huge_bump_then_rest_returns_to_zero() {
    let mut estimator = SpeedEstimator::new();
    let mut t = 0;
    for _ in 0..50 {
        estimator.on_sample(&Sample::new(0.0, 0.0, 9.81, t)).unwrap();
        t += STEP_NANOS;
    }

    // Large but representable: the squared norm stays below f64::MAX
    estimator.on_sample(&Sample::new(1e150, 0.0, 9.81, t)).unwrap();
    t += STEP_NANOS;
    // Squared norm overflows: dropped
    assert!(estimator.on_sample(&Sample::new(1e300, 0.0, 9.81, t)).is_err());

    for _ in 0..3000 {
        estimator.on_sample(&Sample::new(0.0, 0.0, 9.81, t)).unwrap();
        t += STEP_NANOS;
    }
    let snapshot = estimator.snapshot();
    assert!(snapshot.filter.estimate.is_finite());
    assert!(snapshot.filtered_acceleration < 0.5);
    assert_eq!(snapshot.speed_mps, 0.0);
    assert_eq!(snapshot.rejected_samples, 1);
}

#[test]
fn unit_switch_mid_drive_keeps_speed() {
    let mut estimator = SpeedEstimator::new();
    let mut t = 0;
    for i in 0..30 {
        let ax = match i {
            0..=4 => 0.0,
            _ if i % 2 == 0 => -8.0,
            _ => 8.0,
        };
        estimator.on_sample(&Sample::new(ax, 0.0, 9.81, t)).unwrap();
        t += STEP_NANOS;
    }
    let speed = estimator.speed();
    assert!(speed > 0.0);

    let knots = estimator.set_unit(SpeedUnit::Knots);
    assert_relative_eq!(knots.value / 1.94384, speed, epsilon = 1e-12);
    assert_eq!(estimator.speed(), speed);

    let mps = estimator.set_unit(SpeedUnit::MetersPerSecond);
    assert_eq!(mps.value, speed);
}

#[test]
fn custom_config_lowers_ceiling() {
    let config = EstimatorConfig {
        max_speed: 2.0,
        ..EstimatorConfig::default()
    };
    let mut estimator = SpeedEstimator::with_config(config).unwrap();
    let mut t = 0;
    for _ in 0..200 {
        estimator.on_sample(&Sample::new(25.0, 25.0, 9.81, t)).unwrap();
        t += 100_000_000;
    }
    assert!(estimator.speed() <= 2.0);
}
