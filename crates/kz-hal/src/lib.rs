//! Kibble-Zurek Sampler Abstraction Layer
//!
//! This crate provides a unified interface for submitting spin-ring problems
//! to annealing samplers, whether a cloud-hosted quantum processor or a local
//! classical fallback.
//!
//! # Overview
//!
//! The HAL abstracts away sampler-specific details, providing:
//! - A common [`Sampler`] trait for job submission, status polling and
//!   sample retrieval
//! - [`SamplerProperties`] to describe the device coupling graph and the
//!   supported anneal-time range
//! - [`IsingProblem`] as the wire-level problem description
//! - [`SampleSet`] as the returned spin assignments
//!
//! # Supported Samplers
//!
//! | Sampler | Crate | Authentication |
//! |---------|-------|----------------|
//! | Local classical annealer | `kz-adapter-classical` | None |
//! | Cloud quantum annealer | `kz-adapter-cloud` | `KZ_API_TOKEN` env var |
//!
//! # Example: Polling a Job
//!
//! ```ignore
//! use kz_hal::{Sampler, SampleParams, submission_label};
//!
//! let submitted_at = chrono::Utc::now();
//! let params = SampleParams::new(0.007, 100).with_label(submission_label(&submitted_at));
//! let job_id = sampler.submit(&problem, &params).await?;
//!
//! // `None` means the job is not (yet) visible under this submission time.
//! if let Some(status) = sampler.status(&job_id, &submitted_at).await? {
//!     println!("{job_id}: {status}");
//! }
//! ```

pub mod error;
pub mod job;
pub mod problem;
pub mod properties;
pub mod registry;
pub mod sampler;
pub mod sampleset;

pub use error::{HalError, HalResult};
pub use job::{JobId, JobStatus, SubmitTime, label_matches, submission_label};
pub use problem::{Coupling, IsingProblem};
pub use properties::{SamplerProperties, Topology};
pub use registry::SamplerRegistry;
pub use sampler::{SampleParams, Sampler};
pub use sampleset::SampleSet;
