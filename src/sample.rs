use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: f64 = 1e9;

/// Raw accelerometer sample as delivered by the sensor source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub timestamp_nanos: i64,
}

impl Sample {
    pub fn new(ax: f64, ay: f64, az: f64, timestamp_nanos: i64) -> Self {
        Self {
            ax,
            ay,
            az,
            timestamp_nanos,
        }
    }

    pub fn acceleration(&self) -> Vector3<f64> {
        Vector3::new(self.ax, self.ay, self.az)
    }

    pub fn is_finite(&self) -> bool {
        self.ax.is_finite() && self.ay.is_finite() && self.az.is_finite()
    }

    /// Seconds elapsed since `earlier_nanos`, negative when this sample is older.
    /// Widened to i128 so any pair of i64 timestamps has a gap.
    pub fn seconds_since(&self, earlier_nanos: i64) -> f64 {
        (self.timestamp_nanos as i128 - earlier_nanos as i128) as f64 / NANOS_PER_SECOND
    }
}
