// Speed Detector core
// Turns raw accelerometer samples into a smoothed speed in a selectable unit

pub mod config;
pub mod display;
pub mod error;
pub mod estimator;
pub mod filters;
pub mod integrator;
pub mod replay;
pub mod sample;
pub mod sensors;
pub mod units;

pub use config::EstimatorConfig;
pub use display::{ChannelSink, DisplayReading, DisplaySink};
pub use error::{EstimatorError, Result};
pub use estimator::{EstimatorSnapshot, SharedEstimator, SpeedEstimator};
pub use filters::{FilterState, GravityIsolator, ScalarKalmanFilter};
pub use integrator::{MotionMode, MotionState, SpeedIntegrator};
pub use sample::Sample;
pub use units::SpeedUnit;
