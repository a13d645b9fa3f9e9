use nalgebra::Vector3;

use crate::config::GRAVITY_ALPHA;

/// Exponential low-pass that tracks gravity per axis; the residual is the
/// linear acceleration.
#[derive(Clone, Debug)]
pub struct GravityIsolator {
    alpha: f64,
    gravity: Vector3<f64>,
}

impl GravityIsolator {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            gravity: Vector3::zeros(),
        }
    }

    /// Returns `raw - gravity` after folding `raw` into the gravity estimate.
    /// Non-finite input propagates; callers reject it first.
    pub fn update(&mut self, raw: Vector3<f64>) -> Vector3<f64> {
        self.gravity = self.next_gravity(raw);
        raw - self.gravity
    }

    /// Like `update`, but leaves the gravity estimate untouched and returns
    /// `None` when the new estimate or the magnitude of the linear residual
    /// would not be finite.
    pub fn try_update(&mut self, raw: Vector3<f64>) -> Option<Vector3<f64>> {
        let gravity = self.next_gravity(raw);
        let linear = raw - gravity;
        if !gravity.iter().all(|g| g.is_finite()) || !linear.norm().is_finite() {
            return None;
        }
        self.gravity = gravity;
        Some(linear)
    }

    fn next_gravity(&self, raw: Vector3<f64>) -> Vector3<f64> {
        self.gravity * self.alpha + raw * (1.0 - self.alpha)
    }

    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    pub fn reset(&mut self) {
        self.gravity = Vector3::zeros();
    }
}

impl Default for GravityIsolator {
    fn default() -> Self {
        Self::new(GRAVITY_ALPHA)
    }
}
