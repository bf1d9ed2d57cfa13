//! Cloud sampler implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ndarray::Array2;
use tracing::{debug, info, instrument, warn};

use kz_hal::{
    HalError, HalResult, IsingProblem, JobId, JobStatus, SampleParams, SampleSet, Sampler,
    SamplerProperties, SubmitTime, Topology, label_matches,
};

use crate::api::{
    Answer, CloudClient, ProblemData, SolverInfo, SubmitParams, SubmitRequest,
};
use crate::error::{CloudError, CloudResult};

/// A quantum annealer reached through the solver API.
pub struct CloudSampler {
    client: Arc<CloudClient>,
    solver_id: String,
    properties: SamplerProperties,
}

impl CloudSampler {
    /// Create a sampler for a listed solver.
    ///
    /// The solver's coupler list becomes the device topology.
    pub fn from_solver(client: Arc<CloudClient>, solver: &SolverInfo) -> Self {
        let topology = Topology::custom(solver.properties.couplers.clone());
        let mut properties = SamplerProperties::quantum(
            solver.id.clone(),
            topology,
            solver
                .properties
                .fast_anneal_time_range
                .unwrap_or((0.0, 0.0)),
        );
        if let Some((_, max)) = solver.properties.num_reads_range {
            properties.max_num_reads = max;
        }
        Self {
            client,
            solver_id: solver.id.clone(),
            properties,
        }
    }

    /// Connect to the API and pick up every online solver whose fast-anneal
    /// range covers `fast_anneal_range_us`.
    #[instrument(skip(token))]
    pub async fn connect(
        endpoint: &str,
        token: &str,
        fast_anneal_range_us: (f64, f64),
        timeout: Duration,
    ) -> CloudResult<Vec<CloudSampler>> {
        let client = Arc::new(CloudClient::new(endpoint, token, timeout)?);
        let solvers = client.list_solvers().await?;
        let samplers: Vec<CloudSampler> = solvers
            .iter()
            .filter(|s| s.online && s.covers_fast_anneal(fast_anneal_range_us))
            .map(|s| CloudSampler::from_solver(Arc::clone(&client), s))
            .collect();

        if samplers.is_empty() {
            return Err(CloudError::NoSolver(
                fast_anneal_range_us.0,
                fast_anneal_range_us.1,
            ));
        }
        info!(
            "Found {} of {} solvers supporting fast anneal",
            samplers.len(),
            solvers.len()
        );
        Ok(samplers)
    }

    /// Solver identifier.
    pub fn solver_id(&self) -> &str {
        &self.solver_id
    }

    fn request(&self, problem: &IsingProblem, params: &SampleParams) -> SubmitRequest {
        let mut data = ProblemData::default();
        for &(v, h) in &problem.linear {
            *data.linear.entry(v).or_insert(0.0) += h;
        }
        data.quadratic = problem.quadratic.iter().map(|c| (c.u, c.v, c.bias)).collect();

        SubmitRequest {
            solver: self.solver_id.clone(),
            problem_type: "ising".to_string(),
            data,
            params: SubmitParams {
                annealing_time: params.annealing_time_us,
                num_reads: params.num_reads,
                fast_anneal: params.fast_anneal,
                auto_scale: params.auto_scale,
                answer_mode: "raw".to_string(),
            },
            label: params.label.clone(),
        }
    }
}

impl std::fmt::Debug for CloudSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSampler")
            .field("solver_id", &self.solver_id)
            .field("client", &self.client)
            .finish()
    }
}

/// Convert a raw answer into a sample set over its active variables.
fn answer_to_samples(answer: Answer) -> CloudResult<SampleSet> {
    let ncols = answer.active_variables.len();
    if answer.solutions.iter().any(|row| row.len() != ncols) {
        return Err(CloudError::MalformedAnswer(format!(
            "solution rows do not match {ncols} active variables"
        )));
    }
    let nrows = answer.solutions.len();
    let flat: Vec<i8> = answer.solutions.into_iter().flatten().collect();
    let record = Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| CloudError::MalformedAnswer(e.to_string()))?;
    SampleSet::new(answer.active_variables, record, answer.energies)
        .map_err(|e| CloudError::MalformedAnswer(e.to_string()))
}

#[async_trait]
impl Sampler for CloudSampler {
    fn name(&self) -> &str {
        &self.solver_id
    }

    fn properties(&self) -> &SamplerProperties {
        &self.properties
    }

    #[instrument(skip(self, problem, params), fields(solver = %self.solver_id))]
    async fn submit(&self, problem: &IsingProblem, params: &SampleParams) -> HalResult<JobId> {
        if !self.properties.covers_anneal_time(params.annealing_time_us) {
            let (min_us, max_us) = self.properties.anneal_time_range_us;
            return Err(HalError::AnnealTimeOutOfRange {
                requested_us: params.annealing_time_us,
                min_us,
                max_us,
            });
        }
        if params.num_reads == 0 || params.num_reads > self.properties.max_num_reads {
            return Err(HalError::SubmissionFailed(format!(
                "num_reads {} outside 1..={}",
                params.num_reads, self.properties.max_num_reads
            )));
        }

        let request = self.request(problem, params);
        let status = self.client.submit_problem(&request).await?;
        debug!("Submitted problem {} ({})", status.id, status.status);
        Ok(JobId::new(status.id))
    }

    #[instrument(skip(self, submitted_at))]
    async fn status(
        &self,
        job_id: &JobId,
        submitted_at: &SubmitTime,
    ) -> HalResult<Option<JobStatus>> {
        let problem = match self.client.get_problem(job_id.as_str()).await {
            Ok(problem) => problem,
            Err(CloudError::ProblemNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let label = problem.label.as_deref().unwrap_or_default();
        if !label_matches(label, submitted_at) {
            debug!("Problem {} carries a stale label", job_id);
            return Ok(None);
        }

        match problem.status.parse::<JobStatus>() {
            Ok(status) => {
                if status == JobStatus::Failed {
                    if let Some(msg) = &problem.error_message {
                        warn!("Problem {} failed: {}", job_id, msg);
                    }
                }
                Ok(Some(status))
            }
            Err(e) => Err(HalError::Sampler(e)),
        }
    }

    #[instrument(skip(self))]
    async fn samples(&self, job_id: &JobId) -> HalResult<SampleSet> {
        let answer = self.client.get_answer(job_id.as_str()).await?;
        Ok(answer_to_samples(answer)?)
    }
}
