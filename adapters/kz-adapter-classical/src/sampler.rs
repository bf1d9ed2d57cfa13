//! Classical sampler implementation.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use kz_hal::{
    HalError, HalResult, IsingProblem, JobId, JobStatus, SampleParams, SampleSet, Sampler,
    SamplerProperties, SubmitTime, Topology, label_matches,
};

use crate::anneal::{GlauberAnneal, sweeps_for};

/// Settings of the classical sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalConfig {
    /// Display name.
    pub name: String,
    /// Lattice reported as the device graph.
    pub topology: Topology,
    /// Sweeps per nanosecond of anneal time.
    pub sweeps_per_ns: f64,
    /// Final inverse temperature of the anneal.
    pub beta: f64,
    /// Fixed RNG seed; random if unset.
    pub seed: Option<u64>,
}

impl Default for ClassicalConfig {
    fn default() -> Self {
        Self {
            name: "Diffusion [Classical]".to_string(),
            topology: Topology::torus(16, 16),
            sweeps_per_ns: 1.0,
            beta: 3.0,
            seed: None,
        }
    }
}

/// A finished job.
struct ClassicalJob {
    label: String,
    samples: SampleSet,
}

/// Local annealing sampler.
///
/// Jobs run to completion inside [`Sampler::submit`] on the blocking pool.
/// Only the latest job is kept; submitting evicts its predecessor.
pub struct ClassicalSampler {
    config: ClassicalConfig,
    properties: SamplerProperties,
    jobs: Arc<Mutex<FxHashMap<String, ClassicalJob>>>,
    rng: Arc<Mutex<StdRng>>,
}

impl ClassicalSampler {
    /// Create a sampler with default settings.
    pub fn new() -> Self {
        Self::with_config(ClassicalConfig::default())
    }

    /// Create a sampler with custom settings.
    pub fn with_config(config: ClassicalConfig) -> Self {
        let properties = SamplerProperties::classical(config.name.clone(), config.topology.clone());
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            properties,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Sampler settings.
    pub fn config(&self) -> &ClassicalConfig {
        &self.config
    }

    /// Number of jobs held.
    pub fn job_count(&self) -> usize {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl Default for ClassicalSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sampler for ClassicalSampler {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn properties(&self) -> &SamplerProperties {
        &self.properties
    }

    #[instrument(skip(self, problem, params), fields(variables = problem.num_variables()))]
    async fn submit(&self, problem: &IsingProblem, params: &SampleParams) -> HalResult<JobId> {
        if params.num_reads == 0 {
            return Err(HalError::SubmissionFailed("num_reads must be positive".into()));
        }
        let anneal = GlauberAnneal::new(problem, self.config.beta)?;
        let sweeps = sweeps_for(params.annealing_time_us, self.config.sweeps_per_ns);
        debug!(
            "Sampling {} variables: {} reads x {} sweeps",
            anneal.num_variables(),
            params.num_reads,
            sweeps
        );

        let problem = problem.clone();
        let num_reads = params.num_reads;
        let rng = Arc::clone(&self.rng);
        let start = Instant::now();
        let samples = tokio::task::spawn_blocking(move || {
            let mut rng = rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            anneal.sample(&problem, &mut *rng, num_reads, sweeps)
        })
        .await
        .map_err(|e| HalError::Sampler(format!("sampling task failed: {e}")))??;
        debug!("Sampling completed in {:?}", start.elapsed());

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !jobs.is_empty() {
            debug!("Evicting {} previous job(s)", jobs.len());
            jobs.clear();
        }
        jobs.insert(
            job_id.0.clone(),
            ClassicalJob {
                label: params.label.clone(),
                samples,
            },
        );
        drop(jobs);
        debug!("Submitted job: {}", job_id);
        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId, submitted_at: &SubmitTime) -> HalResult<Option<JobStatus>> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(jobs
            .get(&job_id.0)
            .filter(|job| label_matches(&job.label, submitted_at))
            .map(|_| JobStatus::Completed))
    }

    async fn samples(&self, job_id: &JobId) -> HalResult<SampleSet> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|job| job.samples.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }
}
