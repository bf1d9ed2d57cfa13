//! Local Classical Fallback Sampler
//!
//! This crate provides a Markov-chain sampler that runs on the local
//! machine, for trying out the dashboard without access to a quantum
//! annealer. Each read starts from a random configuration and applies
//! heat-bath sweeps at random sites while the inverse temperature ramps
//! up to its final value; the number of sweeps is proportional to the
//! requested anneal time.
//!
//! Kinks in a ring diffuse and annihilate under these dynamics, so the
//! kink density also falls with anneal time, but for reasons unrelated to
//! the Kibble-Zurek mechanism.
//!
//! # Features
//!
//! - **No network**: jobs complete during `submit`
//! - **No embedding**: problems are sampled on their logical variables
//! - **Reproducible**: optional fixed seed
//! - **One job held**: a submission replaces the previous job
//!
//! # Example
//!
//! ```ignore
//! use kz_adapter_classical::ClassicalSampler;
//! use kz_hal::{Sampler, SampleParams};
//!
//! let sampler = ClassicalSampler::new();
//! let job_id = sampler.submit(&problem, &SampleParams::new(0.007, 100)).await?;
//! let samples = sampler.samples(&job_id).await?;
//! ```

mod anneal;
mod sampler;

pub use anneal::{GlauberAnneal, flip_probability, sweeps_for};
pub use sampler::{ClassicalConfig, ClassicalSampler};
