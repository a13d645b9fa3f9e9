//! Speed integration with stop detection.
//!
//! Plain integration of a noisy acceleration magnitude drifts upward without
//! bound. Each step therefore either integrates (acceleration above the stop
//! threshold) or decays the speed multiplicatively and counts towards a hard
//! stop. Friction and the speed ceiling are applied on every step.

use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;
use crate::error::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub speed: f64,
    pub low_acceleration_streak: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// Acceleration above the stop threshold, speed integrating
    Accelerating,
    /// Low acceleration, speed decaying towards zero
    Decaying,
    /// Stop streak completed, speed forced to zero
    Stopped,
}

#[derive(Clone, Debug)]
pub struct SpeedIntegrator {
    state: MotionState,
    mode: MotionMode,
    hit_ceiling: bool,

    immediate_stop_threshold: f64,
    max_speed: f64,
    stop_detection_samples: u32,
    friction_coefficient: f64,
    speed_decay_factor: f64,
}

impl SpeedIntegrator {
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Caller guarantees `config.validate()` has passed
    pub(crate) fn from_validated(config: &EstimatorConfig) -> Self {
        Self {
            state: MotionState::default(),
            mode: MotionMode::Stopped,
            hit_ceiling: false,
            immediate_stop_threshold: config.immediate_stop_threshold,
            max_speed: config.max_speed,
            stop_detection_samples: config.stop_detection_samples,
            friction_coefficient: config.friction_coefficient,
            speed_decay_factor: config.speed_decay_factor,
        }
    }

    pub fn update(&mut self, filtered_acceleration: f64, delta_time_seconds: f64) -> f64 {
        // Duplicate or out-of-order timestamps
        if !(delta_time_seconds > 0.0) || !delta_time_seconds.is_finite() {
            return self.state.speed;
        }

        let mut speed = self.state.speed;

        if filtered_acceleration.abs() < self.immediate_stop_threshold {
            speed *= self.speed_decay_factor;
            self.state.low_acceleration_streak += 1;
            self.mode = MotionMode::Decaying;
            if self.state.low_acceleration_streak >= self.stop_detection_samples {
                speed = 0.0;
                self.state.low_acceleration_streak = 0;
                self.mode = MotionMode::Stopped;
            }
        } else {
            speed += filtered_acceleration * delta_time_seconds;
            self.state.low_acceleration_streak = 0;
            self.mode = MotionMode::Accelerating;
        }

        speed *= self.friction_coefficient;

        self.hit_ceiling = speed > self.max_speed;
        self.state.speed = speed.clamp(0.0, self.max_speed);
        self.state.speed
    }

    pub fn speed(&self) -> f64 {
        self.state.speed
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Mode entered by the last integrating step
    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    /// Whether the last integrating step was cut back to the speed ceiling
    pub fn hit_ceiling(&self) -> bool {
        self.hit_ceiling
    }

    pub fn reset(&mut self) {
        self.state = MotionState::default();
        self.mode = MotionMode::Stopped;
        self.hit_ceiling = false;
    }
}

impl Default for SpeedIntegrator {
    fn default() -> Self {
        Self::from_validated(&EstimatorConfig::default())
    }
}
