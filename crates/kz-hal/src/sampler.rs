//! Sampler trait and submission parameters.
//!
//! The [`Sampler`] trait defines the lifecycle for interacting with an
//! annealing sampler:
//!
//! ```text
//!   properties() ──→ submit() ──→ status() ──→ samples()
//!    (sync, &ref)     (async)      (async)      (async)
//! ```
//!
//! ## Method table
//!
//! | Method | Kind | Returns |
//! |--------|------|---------|
//! | `name()` | sync | `&str` |
//! | `properties()` | sync | `&SamplerProperties` |
//! | `submit()` | async | `HalResult<JobId>` |
//! | `status()` | async | `HalResult<Option<JobStatus>>` |
//! | `samples()` | async | `HalResult<SampleSet>` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HalResult;
use crate::job::{JobId, JobStatus, SubmitTime};
use crate::problem::IsingProblem;
use crate::properties::SamplerProperties;
use crate::sampleset::SampleSet;

/// Parameters for a sampling job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
    /// Anneal time in microseconds.
    pub annealing_time_us: f64,
    /// Number of reads.
    pub num_reads: u32,
    /// Job label; carries the submission time.
    pub label: String,
    /// Use the fast-anneal protocol.
    pub fast_anneal: bool,
    /// Let the sampler rescale biases to its range.
    pub auto_scale: bool,
}

impl SampleParams {
    /// Create parameters for a fast, unscaled, raw-answer anneal.
    pub fn new(annealing_time_us: f64, num_reads: u32) -> Self {
        Self {
            annealing_time_us,
            num_reads,
            label: String::new(),
            fast_anneal: true,
            auto_scale: false,
        }
    }

    /// Set the job label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Trait for annealing samplers.
///
/// # Contract
///
/// - `properties()` MUST be synchronous and infallible; properties are
///   cached at construction time.
/// - `submit()` returns as soon as the job is accepted.
/// - `status()` MUST return `Ok(None)` when the job is unknown or was
///   submitted at a different time than `submitted_at`. Callers treat this
///   as "still pending".
/// - `samples()` MUST only be called when status is `Completed`.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Get the name of this sampler.
    fn name(&self) -> &str;

    /// Get the static properties of this sampler.
    fn properties(&self) -> &SamplerProperties;

    /// Whether this is the local classical fallback.
    fn is_classical(&self) -> bool {
        self.properties().is_classical
    }

    /// Submit a problem for sampling.
    async fn submit(&self, problem: &IsingProblem, params: &SampleParams) -> HalResult<JobId>;

    /// Get the status of a job submitted at `submitted_at`.
    async fn status(&self, job_id: &JobId, submitted_at: &SubmitTime)
    -> HalResult<Option<JobStatus>>;

    /// Get the samples of a completed job, labelled by physical variable.
    async fn samples(&self, job_id: &JobId) -> HalResult<SampleSet>;
}
