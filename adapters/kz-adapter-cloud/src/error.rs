//! Error types for the cloud adapter.

use thiserror::Error;

/// Result type for cloud API operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors that can occur when talking to the solver API.
#[derive(Debug, Error)]
pub enum CloudError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing API token.
    #[error("Missing API token: set KZ_API_TOKEN environment variable")]
    MissingToken,

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Problem not found.
    #[error("Problem not found: {0}")]
    ProblemNotFound(String),

    /// Problem execution failed.
    #[error("Problem failed: {0}")]
    ProblemFailed(String),

    /// No solver matches the requested anneal-time range.
    #[error("No solver covers fast-anneal range [{0}, {1}] us")]
    NoSolver(f64, f64),

    /// The answer does not match the submitted problem.
    #[error("Malformed answer: {0}")]
    MalformedAnswer(String),
}

impl From<CloudError> for kz_hal::HalError {
    fn from(e: CloudError) -> Self {
        match e {
            CloudError::MissingToken => kz_hal::HalError::AuthenticationFailed(e.to_string()),
            CloudError::ApiError { status: 401, .. } => {
                kz_hal::HalError::AuthenticationFailed(e.to_string())
            }
            CloudError::ProblemNotFound(id) => kz_hal::HalError::JobNotFound(id),
            CloudError::ProblemFailed(msg) => kz_hal::HalError::JobFailed(msg),
            CloudError::NoSolver(..) => kz_hal::HalError::SamplerUnavailable(e.to_string()),
            CloudError::MalformedAnswer(msg) => kz_hal::HalError::InvalidSampleSet(msg),
            CloudError::Http(err) => kz_hal::HalError::Network(err),
            CloudError::Json(err) => kz_hal::HalError::Serialization(err),
            CloudError::ApiError { .. } => kz_hal::HalError::Sampler(e.to_string()),
        }
    }
}
