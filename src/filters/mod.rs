pub mod gravity;
pub mod kalman;

pub use gravity::GravityIsolator;
pub use kalman::{FilterState, ScalarKalmanFilter};
