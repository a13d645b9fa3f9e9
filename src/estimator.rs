// estimator.rs — Per-sample speed pipeline
//
// raw sample → gravity isolation → |linear| → Kalman smoothing → clamp
//            → speed integration → unit conversion → display sink
//
// `SpeedEstimator` is single-writer and owns every piece of mutable state.
// `SharedEstimator` puts one behind a mutex for callers that change the unit
// from a different thread than the one delivering samples.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::EstimatorConfig;
use crate::display::{DisplayReading, DisplaySink};
use crate::error::{EstimatorError, Result};
use crate::filters::{FilterState, GravityIsolator, ScalarKalmanFilter};
use crate::integrator::{MotionMode, MotionState, SpeedIntegrator};
use crate::sample::Sample;
use crate::units::SpeedUnit;

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct EstimatorSnapshot {
    pub speed_mps: f64,
    pub display: DisplayReading,
    pub unit: SpeedUnit,
    pub mode: MotionMode,
    pub motion: MotionState,
    pub gravity: (f64, f64, f64),
    pub filter: FilterState,
    pub filtered_acceleration: f64,
    pub accepted_samples: u64,
    pub rejected_samples: u64,
}

// ─── Estimator ───────────────────────────────────────────────────────────────

pub struct SpeedEstimator {
    config: EstimatorConfig,

    gravity: GravityIsolator,
    kalman: ScalarKalmanFilter,
    integrator: SpeedIntegrator,

    unit: SpeedUnit,
    sink: Option<Box<dyn DisplaySink>>,

    last_timestamp: Option<i64>,
    filtered_acceleration: f64,
    accepted_samples: u64,
    rejected_samples: u64,
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self::build(EstimatorConfig::default())
    }

    pub fn with_config(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EstimatorConfig) -> Self {
        Self {
            gravity: GravityIsolator::new(config.gravity_alpha),
            kalman: ScalarKalmanFilter::new(config.process_noise, config.measurement_noise),
            integrator: SpeedIntegrator::from_validated(&config),
            config,
            unit: SpeedUnit::default(),
            sink: None,
            last_timestamp: None,
            filtered_acceleration: 0.0,
            accepted_samples: 0,
            rejected_samples: 0,
        }
    }

    pub fn with_unit(mut self, unit: SpeedUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_sink<S: DisplaySink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    // ── Sample feed ──────────────────────────────────────────────────────

    /// Run one accelerometer sample through the pipeline and notify the sink.
    ///
    /// Non-finite or out-of-order samples are dropped before they touch any
    /// filter state; the sink is not notified and the rejection is returned.
    /// A finite sample whose linear acceleration magnitude overflows counts as
    /// non-finite.
    pub fn on_sample(&mut self, sample: &Sample) -> Result<DisplayReading> {
        if !sample.is_finite() {
            self.rejected_samples += 1;
            log::debug!("dropping non-finite sample at {}", sample.timestamp_nanos);
            return Err(EstimatorError::NonFiniteSample);
        }

        let dt = match self.last_timestamp {
            Some(previous) if sample.timestamp_nanos < previous => {
                self.rejected_samples += 1;
                log::debug!(
                    "dropping out-of-order sample: {} < {}",
                    sample.timestamp_nanos,
                    previous
                );
                return Err(EstimatorError::OutOfOrderSample {
                    timestamp_nanos: sample.timestamp_nanos,
                    previous_nanos: previous,
                });
            }
            Some(previous) => sample.seconds_since(previous),
            // First sample of a session: nothing to integrate against
            None => 0.0,
        };

        let Some(linear) = self.gravity.try_update(sample.acceleration()) else {
            self.rejected_samples += 1;
            log::debug!("dropping sample with overflowing magnitude at {}", sample.timestamp_nanos);
            return Err(EstimatorError::NonFiniteSample);
        };
        self.filtered_acceleration = self
            .kalman
            .update(linear.norm())
            .min(self.config.max_acceleration);

        let previous_speed = self.integrator.speed();
        let previous_mode = self.integrator.mode();
        let speed = self.integrator.update(self.filtered_acceleration, dt);

        if dt > 0.0 {
            let mode = self.integrator.mode();
            if mode != previous_mode {
                log::debug!(
                    "motion mode {:?} -> {:?} (accel {:.3} m/s², speed {:.3} m/s)",
                    previous_mode,
                    mode,
                    self.filtered_acceleration,
                    speed
                );
            }
            if self.integrator.hit_ceiling() && previous_speed < self.config.max_speed {
                log::warn!("speed clamped at {:.1} m/s", self.config.max_speed);
            }
        }

        self.last_timestamp = Some(sample.timestamp_nanos);
        self.accepted_samples += 1;

        Ok(self.notify())
    }

    // ── Unit selection ───────────────────────────────────────────────────

    /// Switch display unit and re-notify with the current speed. Motion state
    /// is left untouched.
    pub fn set_unit(&mut self, unit: SpeedUnit) -> DisplayReading {
        if unit != self.unit {
            log::info!("display unit {} -> {}", self.unit, unit);
        }
        self.unit = unit;
        self.notify()
    }

    /// Return every filter and the motion state to their initial values.
    /// The selected unit and sink are kept.
    pub fn reset(&mut self) {
        self.gravity.reset();
        self.kalman.reset();
        self.integrator.reset();
        self.last_timestamp = None;
        self.filtered_acceleration = 0.0;
        log::info!(
            "estimator reset after {} samples ({} rejected)",
            self.accepted_samples,
            self.rejected_samples
        );
    }

    fn notify(&mut self) -> DisplayReading {
        let reading = self.reading();
        if let Some(sink) = self.sink.as_mut() {
            sink.show(&reading);
        }
        reading
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn speed(&self) -> f64 {
        self.integrator.speed()
    }

    pub fn unit(&self) -> SpeedUnit {
        self.unit
    }

    pub fn reading(&self) -> DisplayReading {
        DisplayReading::new(self.speed(), self.unit)
    }

    pub fn snapshot(&self) -> EstimatorSnapshot {
        let gravity = self.gravity.gravity();
        EstimatorSnapshot {
            speed_mps: self.speed(),
            display: self.reading(),
            unit: self.unit,
            mode: self.integrator.mode(),
            motion: self.integrator.state(),
            gravity: (gravity.x, gravity.y, gravity.z),
            filter: self.kalman.state(),
            filtered_acceleration: self.filtered_acceleration,
            accepted_samples: self.accepted_samples,
            rejected_samples: self.rejected_samples,
        }
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Shared handle ───────────────────────────────────────────────────────────

/// Cloneable handle; every operation holds the lock for its full duration.
#[derive(Clone)]
pub struct SharedEstimator {
    inner: Arc<Mutex<SpeedEstimator>>,
}

impl SharedEstimator {
    pub fn new(estimator: SpeedEstimator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SpeedEstimator>> {
        self.inner.lock().map_err(|_| EstimatorError::LockPoisoned)
    }

    pub fn on_sample(&self, sample: &Sample) -> Result<DisplayReading> {
        self.lock()?.on_sample(sample)
    }

    pub fn set_unit(&self, unit: SpeedUnit) -> Result<DisplayReading> {
        Ok(self.lock()?.set_unit(unit))
    }

    pub fn reset(&self) -> Result<()> {
        self.lock()?.reset();
        Ok(())
    }

    pub fn speed(&self) -> Result<f64> {
        Ok(self.lock()?.speed())
    }

    pub fn snapshot(&self) -> Result<EstimatorSnapshot> {
        Ok(self.lock()?.snapshot())
    }
}
