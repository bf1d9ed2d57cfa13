//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in HAL operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Sampler is not available.
    #[error("Sampler not available: {0}")]
    SamplerUnavailable(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Job submission failed.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Problem does not fit on the sampler.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Sample set is malformed.
    #[error("Invalid sample set: {0}")]
    InvalidSampleSet(String),

    /// Requested anneal time is outside the supported range.
    #[error("Anneal time {requested_us} us outside supported range [{min_us}, {max_us}] us")]
    AnnealTimeOutOfRange {
        /// Requested anneal time in microseconds.
        requested_us: f64,
        /// Lower bound in microseconds.
        min_us: f64,
        /// Upper bound in microseconds.
        max_us: f64,
    },

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout waiting for the sampler.
    #[error("Timeout waiting for job {0}")]
    Timeout(String),

    /// Generic sampler error.
    #[error("Sampler error: {0}")]
    Sampler(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anneal_time_display() {
        let err = HalError::AnnealTimeOutOfRange {
            requested_us: 0.5,
            min_us: 0.005,
            max_us: 0.1,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.5"));
        assert!(msg.contains("0.1"));
    }
}
