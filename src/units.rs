use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EstimatorError;

const KMH_PER_MPS: f64 = 3.6;
const KNOTS_PER_MPS: f64 = 1.94384;

/// Display unit for speed. Conversions are pure; the estimator always works in m/s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    #[default]
    MetersPerSecond,
    KilometersPerHour,
    Knots,
}

impl SpeedUnit {
    pub const ALL: [SpeedUnit; 3] = [
        SpeedUnit::MetersPerSecond,
        SpeedUnit::KilometersPerHour,
        SpeedUnit::Knots,
    ];

    pub fn factor(self) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => 1.0,
            SpeedUnit::KilometersPerHour => KMH_PER_MPS,
            SpeedUnit::Knots => KNOTS_PER_MPS,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::Knots => "knots",
        }
    }

    pub fn convert(self, speed_mps: f64) -> (f64, &'static str) {
        (speed_mps * self.factor(), self.suffix())
    }
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for SpeedUnit {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ms" | "m/s" | "mps" => Ok(SpeedUnit::MetersPerSecond),
            "kmh" | "km/h" | "kph" => Ok(SpeedUnit::KilometersPerHour),
            "kn" | "kt" | "knots" => Ok(SpeedUnit::Knots),
            other => Err(EstimatorError::InvalidParameters(format!(
                "unknown speed unit '{}'",
                other
            ))),
        }
    }
}
