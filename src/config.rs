use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{EstimatorError, Result};

// ─── Defaults ────────────────────────────────────────────────────────────────

pub const PROCESS_NOISE: f64 = 0.1;
pub const MEASUREMENT_NOISE: f64 = 0.1;
pub const GRAVITY_ALPHA: f64 = 0.8;
pub const IMMEDIATE_STOP_THRESHOLD: f64 = 0.5; // m/s²
pub const MAX_ACCELERATION: f64 = 30.0; // m/s²
pub const MAX_SPEED: f64 = 100.0; // m/s
pub const STOP_DETECTION_SAMPLES: u32 = 10;
pub const FRICTION_COEFFICIENT: f64 = 0.98;
pub const SPEED_DECAY_FACTOR: f64 = 0.8;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    // ── Kalman smoothing ──
    pub process_noise: f64,
    pub measurement_noise: f64,

    // ── Gravity low-pass ──
    pub gravity_alpha: f64,

    // ── Integration ──
    pub immediate_stop_threshold: f64,
    pub max_acceleration: f64,
    pub max_speed: f64,
    pub stop_detection_samples: u32,
    pub friction_coefficient: f64,
    pub speed_decay_factor: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            process_noise: PROCESS_NOISE,
            measurement_noise: MEASUREMENT_NOISE,
            gravity_alpha: GRAVITY_ALPHA,
            immediate_stop_threshold: IMMEDIATE_STOP_THRESHOLD,
            max_acceleration: MAX_ACCELERATION,
            max_speed: MAX_SPEED,
            stop_detection_samples: STOP_DETECTION_SAMPLES,
            friction_coefficient: FRICTION_COEFFICIENT,
            speed_decay_factor: SPEED_DECAY_FACTOR,
        }
    }
}

impl EstimatorConfig {
    /// Load a JSON config file; absent fields keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EstimatorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: EstimatorConfig =
            serde_json::from_str(text).map_err(|e| EstimatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.process_noise > 0.0 && self.process_noise.is_finite()) {
            return Err(invalid("process_noise must be positive", self.process_noise));
        }
        if !(self.measurement_noise > 0.0 && self.measurement_noise.is_finite()) {
            return Err(invalid(
                "measurement_noise must be positive",
                self.measurement_noise,
            ));
        }
        if !(0.0..1.0).contains(&self.gravity_alpha) {
            return Err(invalid("gravity_alpha must be in [0, 1)", self.gravity_alpha));
        }
        if !(self.immediate_stop_threshold >= 0.0 && self.immediate_stop_threshold.is_finite()) {
            return Err(invalid(
                "immediate_stop_threshold must be non-negative",
                self.immediate_stop_threshold,
            ));
        }
        if !(self.max_acceleration > 0.0 && self.max_acceleration.is_finite()) {
            return Err(invalid(
                "max_acceleration must be positive",
                self.max_acceleration,
            ));
        }
        if !(self.max_speed > 0.0 && self.max_speed.is_finite()) {
            return Err(invalid("max_speed must be positive", self.max_speed));
        }
        if self.stop_detection_samples == 0 {
            return Err(EstimatorError::InvalidParameters(
                "stop_detection_samples must be at least 1".to_string(),
            ));
        }
        if !(self.friction_coefficient > 0.0 && self.friction_coefficient <= 1.0) {
            return Err(invalid(
                "friction_coefficient must be in (0, 1]",
                self.friction_coefficient,
            ));
        }
        if !(self.speed_decay_factor > 0.0 && self.speed_decay_factor <= 1.0) {
            return Err(invalid(
                "speed_decay_factor must be in (0, 1]",
                self.speed_decay_factor,
            ));
        }
        Ok(())
    }
}

fn invalid(what: &str, value: f64) -> EstimatorError {
    EstimatorError::InvalidParameters(format!("{} (got {})", what, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EstimatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stop_detection_samples, 10);
        assert_eq!(config.max_speed, 100.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EstimatorConfig::from_json(r#"{ "max_speed": 50.0 }"#).unwrap();
        assert_eq!(config.max_speed, 50.0);
        assert_eq!(config.process_noise, PROCESS_NOISE);
        assert_eq!(config.gravity_alpha, GRAVITY_ALPHA);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut config = EstimatorConfig::default();
        config.measurement_noise = 0.0;
        assert!(matches!(
            config.validate(),
            Err(EstimatorError::InvalidParameters(_))
        ));

        let mut config = EstimatorConfig::default();
        config.gravity_alpha = 1.0;
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.stop_detection_samples = 0;
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.friction_coefficient = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EstimatorConfig::from_json("{ not json"),
            Err(EstimatorError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = EstimatorConfig::load("/nonexistent/speed_detector.json");
        assert!(matches!(result, Err(EstimatorError::Config(_))));
    }
}
