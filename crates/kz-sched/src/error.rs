//! Error handling for embedding, persistence and session orchestration.

use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur while preparing, submitting or evaluating a job.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Ring too short to embed.
    #[error("Invalid ring size: {0} (need at least 3 spins)")]
    InvalidRingSize(usize),

    /// A session parameter is out of range.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The device graph holds no cycle of the requested length.
    #[error("No one-to-one embedding found for {0} spins")]
    EmbeddingNotFound(usize),

    /// The embedding search hit its deadline.
    #[error("Embedding search for {ring_size} spins timed out after {secs} s")]
    EmbeddingTimeout { ring_size: usize, secs: f64 },

    /// An embedding does not cover the problem or the sample set.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// No sampler is selected or registered.
    #[error("No solver available")]
    NoSolver,

    /// Sampler not found in the registry.
    #[error("Sampler not found: {0}")]
    SamplerNotFound(String),

    /// Operation requires a completed job.
    #[error("Invalid job state: expected {expected}, found {found}")]
    InvalidJobState { expected: String, found: String },

    /// Sampler error during submission or retrieval.
    #[error("Sampler error: {0}")]
    Sampler(#[from] kz_hal::HalError),

    /// Physics computation failed.
    #[error("Physics error: {0}")]
    Physics(#[from] kz_physics::PhysicsError),

    /// Persistence error.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Internal error (e.g. a panicked search task).
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedError::EmbeddingNotFound(512);
        assert_eq!(err.to_string(), "No one-to-one embedding found for 512 spins");

        let err = SchedError::InvalidJobState {
            expected: "COMPLETED".to_string(),
            found: "PENDING".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid job state: expected COMPLETED, found PENDING"
        );

        let err: SchedError = kz_physics::PhysicsError::InvalidRing(2).into();
        assert!(err.to_string().starts_with("Physics error"));
    }
}
