use thiserror::Error;

/// Speed estimator error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("Sample contains non-finite acceleration")]
    NonFiniteSample,

    #[error("Sample timestamp {timestamp_nanos} precedes previous {previous_nanos}")]
    OutOfOrderSample {
        timestamp_nanos: i64,
        previous_nanos: i64,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Failed to acquire estimator lock")]
    LockPoisoned,

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for estimator operations
pub type Result<T> = std::result::Result<T, EstimatorError>;

impl EstimatorError {
    /// Rejected samples are dropped locally; everything else is a real failure.
    pub fn is_rejected_sample(&self) -> bool {
        matches!(
            self,
            EstimatorError::NonFiniteSample | EstimatorError::OutOfOrderSample { .. }
        )
    }
}
