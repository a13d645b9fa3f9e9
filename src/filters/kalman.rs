//! One-dimensional Kalman filter for the acceleration magnitude.
//!
//! Constant-state model with no control input: the prediction step only
//! inflates the error covariance by the process noise, and the update step
//! blends the new measurement in with the resulting gain.

use serde::{Deserialize, Serialize};

use crate::config::{MEASUREMENT_NOISE, PROCESS_NOISE};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub estimate: f64,
    pub error_estimate: f64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            estimate: 0.0,
            error_estimate: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScalarKalmanFilter {
    state: FilterState,
    q: f64, // process noise
    r: f64, // measurement noise
    last_gain: f64,
}

impl ScalarKalmanFilter {
    /// `q` and `r` must be positive; `EstimatorConfig::validate` enforces this.
    pub fn new(q: f64, r: f64) -> Self {
        Self {
            state: FilterState::default(),
            q,
            r,
            last_gain: 0.0,
        }
    }

    pub fn update(&mut self, measurement: f64) -> f64 {
        // Predict
        let predicted_estimate = self.state.estimate;
        let predicted_error = self.state.error_estimate + self.q;

        // Update
        let gain = predicted_error / (predicted_error + self.r);
        self.state.estimate = predicted_estimate + gain * (measurement - predicted_estimate);
        self.state.error_estimate = (1.0 - gain) * predicted_error;
        self.last_gain = gain;

        self.state.estimate
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Gain applied by the most recent update (0 before the first one)
    pub fn last_gain(&self) -> f64 {
        self.last_gain
    }

    pub fn reset(&mut self) {
        self.state = FilterState::default();
        self.last_gain = 0.0;
    }
}

impl Default for ScalarKalmanFilter {
    fn default() -> Self {
        Self::new(PROCESS_NOISE, MEASUREMENT_NOISE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_state() {
        let filter = ScalarKalmanFilter::default();
        assert_eq!(filter.state(), FilterState { estimate: 0.0, error_estimate: 1.0 });
    }

    #[test]
    fn test_first_update() {
        let mut filter = ScalarKalmanFilter::default();
        let estimate = filter.update(2.0);

        // predicted error 1.1, gain 1.1 / 1.2
        let gain = 1.1 / 1.2;
        assert_relative_eq!(filter.last_gain(), gain, epsilon = 1e-12);
        assert_relative_eq!(estimate, gain * 2.0, epsilon = 1e-12);
        assert_relative_eq!(filter.state().error_estimate, (1.0 - gain) * 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_converges_to_constant_measurement() {
        let mut filter = ScalarKalmanFilter::default();
        let mut estimate = 0.0;
        for _ in 0..50 {
            estimate = filter.update(5.0);
        }
        assert_relative_eq!(estimate, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_error_estimate_stays_positive_and_gain_bounded() {
        let mut filter = ScalarKalmanFilter::default();
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..10_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let measurement = (seed % 10_000) as f64 / 100.0 - 50.0;
            filter.update(measurement);
            assert!(filter.state().error_estimate > 0.0);
            assert!(filter.last_gain() > 0.0 && filter.last_gain() < 1.0);
        }
    }

    #[test]
    fn test_estimate_within_convex_hull() {
        let mut filter = ScalarKalmanFilter::default();
        // The initial estimate of 0 is part of the history.
        let mut lo: f64 = 0.0;
        let mut hi: f64 = 0.0;
        let mut seed: u64 = 42;
        for _ in 0..5_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let measurement = ((seed >> 33) % 3000) as f64 / 100.0;
            lo = lo.min(measurement);
            hi = hi.max(measurement);
            let estimate = filter.update(measurement);
            assert!(estimate >= lo - 1e-9 && estimate <= hi + 1e-9);
        }
    }

    #[test]
    fn test_reset() {
        let mut filter = ScalarKalmanFilter::default();
        filter.update(3.0);
        filter.update(4.0);
        filter.reset();
        assert_eq!(filter.state(), FilterState::default());
        assert_eq!(filter.last_gain(), 0.0);
    }
}
