//! Session context.
//!
//! A [`Session`] owns everything one dashboard user works with: the
//! selected sampler, its schedule and embedding cache, the job record,
//! the accumulated results and the UI parameters. Triggers from the UI
//! (submit, poll tick) run one lifecycle [`step`] and apply its side
//! effects: caching embeddings, submitting the job, and evaluating the
//! samples once the job completes.

use std::collections::BTreeMap;
use std::sync::Arc;

use kz_hal::{
    JobId, SampleParams, SampleSet, Sampler, SamplerRegistry, SubmitTime, submission_label,
};
use kz_physics::{
    CouplingObservation, KinkStats, ObservationHistory, build_ring, compute_lambda, kink_stats,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::embedding::{EmbeddingCache, EmbeddingFinder};
use crate::error::{SchedError, SchedResult};
use crate::figure::{Figure, FigureInput, GraphDisplay, KzPoint, ProblemKind, build_figure};
use crate::lifecycle::{
    EmbeddingSignal, SamplerStatus, StepInput, StepOutput, SubmitState, Trigger, step,
};
use crate::persistence::EmbeddingRepository;
use crate::schedules::{ScheduleCatalog, ScheduleMatch, ScheduleSelection};

/// User-controlled parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Number of spins in the ring.
    pub ring_size: usize,
    /// Coupling strength J.
    pub coupling_strength: f64,
    /// Anneal time in nanoseconds.
    pub anneal_time_ns: u32,
    pub kind: ProblemKind,
    pub display: GraphDisplay,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            ring_size: 512,
            coupling_strength: -1.4,
            anneal_time_ns: 7,
            kind: ProblemKind::KibbleZurek,
            display: GraphDisplay::KinkDensity,
        }
    }
}

/// Partial parameter update; `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    #[serde(default)]
    pub ring_size: Option<usize>,
    #[serde(default)]
    pub coupling_strength: Option<f64>,
    #[serde(default)]
    pub anneal_time_ns: Option<u32>,
    #[serde(default)]
    pub kind: Option<ProblemKind>,
    #[serde(default)]
    pub display: Option<GraphDisplay>,
}

/// The current submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Option<JobId>,
    pub submitted_at: Option<SubmitTime>,
    pub state: SubmitState,
    /// Parameters the job was submitted with.
    pub params: Option<Parameters>,
    /// Anneal-time rescaling applied in zero-noise mode.
    pub lambda: Option<f64>,
}

impl JobRecord {
    fn idle(state: SubmitState) -> Self {
        Self {
            id: None,
            submitted_at: None,
            state,
            params: None,
            lambda: None,
        }
    }
}

/// Poll timer as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollTimer {
    pub disabled: bool,
    pub interval_ms: u64,
    /// Ticks since the last reset.
    pub ticks: u64,
}

/// Evaluation of the last completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub stats: KinkStats,
    /// Sample whose kink count is closest to the mean.
    pub representative: Vec<i8>,
    /// Coupling strength the job ran with; kinks are counted against it.
    pub coupling_strength: f64,
    pub lambda: Option<f64>,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub sampler: Option<String>,
    pub classical: bool,
    pub schedule_file: String,
    pub schedule_match: ScheduleMatch,
    pub state: SubmitState,
    pub progress: (u8, String),
    pub submit_disabled: bool,
    pub inputs_disabled: bool,
    pub timer: PollTimer,
    pub job_id: Option<JobId>,
    pub submitted_at: Option<SubmitTime>,
    /// `needed`, `not_found` or `found`.
    pub embedding_signal: Option<String>,
    pub cached_ring_sizes: Vec<usize>,
    pub params: Parameters,
    pub error_modal: bool,
    pub no_solver: bool,
    pub classical_warning: bool,
    pub kink_density: Option<f64>,
    pub lambda: Option<f64>,
    pub zne_estimates: BTreeMap<u32, f64>,
    pub last_error: Option<String>,
}

/// One user's working context.
pub struct Session {
    config: Config,
    registry: SamplerRegistry,
    repository: Arc<dyn EmbeddingRepository>,
    catalog: ScheduleCatalog,
    finder: Arc<dyn EmbeddingFinder>,

    sampler: Option<Arc<dyn Sampler>>,
    schedule: ScheduleSelection,
    cache: EmbeddingCache,
    history: ObservationHistory,
    zne_estimates: BTreeMap<u32, f64>,
    kz_points: Vec<KzPoint>,

    job: JobRecord,
    signal: Option<EmbeddingSignal>,
    timer: PollTimer,
    submit_disabled: bool,

    error_modal: bool,
    no_solver: bool,
    classical_warning: bool,
    classical_warned: bool,

    params: Parameters,
    last_result: Option<JobResult>,
    last_error: Option<String>,
}

impl Session {
    /// Create a session. No sampler is selected until [`Self::start`] or
    /// [`Self::select_sampler`] runs.
    pub fn new(
        config: Config,
        registry: SamplerRegistry,
        repository: Arc<dyn EmbeddingRepository>,
        finder: Arc<dyn EmbeddingFinder>,
    ) -> Self {
        let catalog = ScheduleCatalog::new(config.schedules_dir.clone());
        let timer = PollTimer {
            disabled: true,
            interval_ms: config.polling.submit_ms,
            ticks: 0,
        };
        Self {
            config,
            registry,
            repository,
            catalog,
            finder,
            sampler: None,
            schedule: ScheduleSelection::fallback(),
            cache: EmbeddingCache::new(),
            history: ObservationHistory::new(),
            zne_estimates: BTreeMap::new(),
            kz_points: Vec::new(),
            job: JobRecord::idle(SubmitState::Ready),
            signal: None,
            timer,
            submit_disabled: false,
            error_modal: false,
            no_solver: false,
            classical_warning: false,
            classical_warned: false,
            params: Parameters::default(),
            last_result: None,
            last_error: None,
        }
    }

    /// Select the registry's default sampler, or enter NO SOLVER when the
    /// registry is empty.
    pub async fn start(&mut self) -> SchedResult<()> {
        match self.registry.default_name().map(str::to_string) {
            Some(name) => self.select_sampler(&name).await,
            None => {
                warn!("No sampler available");
                self.sampler = None;
                self.job = JobRecord::idle(SubmitState::NoSolver);
                self.schedule = ScheduleSelection::fallback();
                Ok(())
            }
        }
    }

    /// Switch to another sampler. The embedding cache is rebuilt from the
    /// repository and pruned against the new topology; results collected
    /// on the previous sampler are dropped.
    #[instrument(skip(self))]
    pub async fn select_sampler(&mut self, name: &str) -> SchedResult<()> {
        self.ensure_idle()?;
        let sampler = self
            .registry
            .get(name)
            .ok_or_else(|| SchedError::SamplerNotFound(name.to_string()))?;

        self.cache.clear();
        let mut cache = match self.repository.load(name).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Failed to load embeddings for {}: {}", name, e);
                EmbeddingCache::new()
            }
        };
        let edges = sampler.properties().topology.edge_set();
        cache.validate_and_prune(&edges);
        info!(
            "Selected sampler {} with {} cached embeddings",
            name,
            cache.len()
        );
        self.cache = cache;
        self.schedule = self.catalog.resolve(name);
        self.sampler = Some(sampler);

        self.history.clear();
        self.zne_estimates.clear();
        self.kz_points.clear();
        self.job = JobRecord::idle(SubmitState::Ready);
        self.signal = None;
        self.last_result = None;
        self.last_error = None;
        self.error_modal = false;
        self.no_solver = false;
        Ok(())
    }

    /// Apply a parameter update. A new ring size invalidates all results;
    /// a new coupling strength invalidates the Kibble-Zurek points.
    pub fn set_parameters(&mut self, update: ParameterUpdate) -> SchedResult<()> {
        self.ensure_idle()?;
        let mut next = self.params;
        if let Some(n) = update.ring_size {
            next.ring_size = n;
        }
        if let Some(j) = update.coupling_strength {
            next.coupling_strength = j;
        }
        if let Some(t) = update.anneal_time_ns {
            next.anneal_time_ns = t;
        }
        if let Some(kind) = update.kind {
            next.kind = kind;
        }
        if let Some(display) = update.display {
            next.display = display;
        }
        self.validate_parameters(&next)?;

        if next.ring_size != self.params.ring_size {
            debug!("Ring size changed; clearing results");
            self.history.clear();
            self.zne_estimates.clear();
            self.kz_points.clear();
        } else if next.coupling_strength != self.params.coupling_strength {
            debug!("Coupling strength changed; clearing Kibble-Zurek points");
            self.kz_points.clear();
        }
        self.params = next;
        Ok(())
    }

    fn validate_parameters(&self, params: &Parameters) -> SchedResult<()> {
        if params.ring_size < 3 {
            return Err(SchedError::InvalidRingSize(params.ring_size));
        }
        if !params.coupling_strength.is_finite() || params.coupling_strength == 0.0 {
            return Err(SchedError::InvalidParameter {
                name: "coupling_strength",
                reason: format!("{} is not a nonzero number", params.coupling_strength),
            });
        }
        let (min, max) = self.anneal_range_ns(params.kind);
        let t = f64::from(params.anneal_time_ns);
        if t < min || t > max {
            return Err(SchedError::InvalidParameter {
                name: "anneal_time_ns",
                reason: format!("{t} outside [{min}, {max}]"),
            });
        }
        Ok(())
    }

    fn ensure_idle(&self) -> SchedResult<()> {
        if self.job.state.is_running() {
            return Err(SchedError::InvalidJobState {
                expected: "idle".into(),
                found: self.job.state.to_string(),
            });
        }
        Ok(())
    }

    /// Handle a submit click.
    pub async fn submit(&mut self) -> SchedResult<SubmitState> {
        let Some(sampler) = self.sampler.clone() else {
            warn!("Submit without a sampler");
            self.no_solver = true;
            return Ok(self.job.state);
        };
        self.ensure_idle()?;
        self.validate_parameters(&self.params)?;

        self.classical_warning = sampler.is_classical() && !self.classical_warned;
        self.classical_warned |= sampler.is_classical();
        self.signal = None;
        self.last_error = None;

        let output = self.run_step(Trigger::Submit, sampler.as_ref()).await;
        self.apply(output, &sampler).await;
        Ok(self.job.state)
    }

    /// Handle a poll-timer tick. Ticks while the timer is disabled are
    /// ignored.
    pub async fn tick(&mut self) -> SchedResult<SubmitState> {
        let Some(sampler) = self.sampler.clone() else {
            self.no_solver = true;
            return Ok(self.job.state);
        };
        if self.timer.disabled {
            debug!("Tick with disabled timer ignored");
            return Ok(self.job.state);
        }
        self.timer.ticks += 1;

        let output = self.run_step(Trigger::PollTick, sampler.as_ref()).await;
        self.apply(output, &sampler).await;
        Ok(self.job.state)
    }

    async fn run_step(&self, trigger: Trigger, sampler: &dyn Sampler) -> StepOutput {
        let properties = sampler.properties();
        let input = StepInput {
            trigger,
            state: self.job.state,
            job_id: self.job.id.as_ref(),
            submitted_at: self.job.submitted_at,
            ring_size: self.params.ring_size,
            embedding_cached: self.cache.contains(self.params.ring_size),
            classical: properties.is_classical,
            signal: self.signal.as_ref(),
            device_edges: &properties.topology.edges,
            now: chrono::Utc::now(),
        };
        step(
            input,
            self.finder.as_ref(),
            &SamplerStatus(sampler),
            &self.config.polling,
        )
        .await
    }

    async fn apply(&mut self, output: StepOutput, sampler: &Arc<dyn Sampler>) {
        if let Some(disabled) = output.submit_disabled {
            self.submit_disabled = disabled;
        }
        if let Some(disabled) = output.timer_disabled {
            self.timer.disabled = disabled;
        }
        if let Some(interval) = output.interval_ms {
            self.timer.interval_ms = interval;
        }
        if output.reset_ticks {
            self.timer.ticks = 0;
        }

        if let Some(signal) = output.signal {
            if let EmbeddingSignal::Found {
                ring_size,
                embedding,
            } = &signal
            {
                self.cache.merge_discovered(*ring_size, embedding.clone());
                self.persist_cache(sampler.name()).await;
            }
            self.signal = Some(signal);
        }

        let previous = self.job.state;
        if let Some(state) = output.state {
            self.job.state = state;
        }

        if let Some(at) = output.submitted_at {
            if let Err(e) = self.submit_job(sampler.as_ref(), at).await {
                warn!("Submission failed: {}", e);
                self.fail(e);
            }
        }

        if self.job.state == SubmitState::Completed && previous != SubmitState::Completed {
            if let Err(e) = self.collect_results(sampler.as_ref()).await {
                warn!("Evaluating job results failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn fail(&mut self, error: SchedError) {
        self.job.state = SubmitState::Failed;
        self.submit_disabled = false;
        self.timer.disabled = true;
        self.last_error = Some(error.to_string());
    }

    async fn persist_cache(&self, sampler_name: &str) {
        if let Err(e) = self.repository.save(sampler_name, &self.cache).await {
            warn!("Failed to save embeddings for {}: {}", sampler_name, e);
        }
    }

    #[instrument(skip(self, sampler), fields(sampler = sampler.name()))]
    async fn submit_job(&mut self, sampler: &dyn Sampler, submitted_at: SubmitTime) -> SchedResult<()> {
        let params = self.params;
        self.job.submitted_at = Some(submitted_at);
        self.job.id = None;
        self.job.params = Some(params);
        self.job.lambda = None;
        self.last_result = None;

        let ring = build_ring(params.ring_size, params.coupling_strength)?;
        let problem = if sampler.is_classical() {
            ring.to_problem()
        } else {
            self.cache
                .get(params.ring_size)
                .ok_or(SchedError::EmbeddingNotFound(params.ring_size))?
                .embed(&ring.to_problem())?
        };

        let mut anneal_time_us = f64::from(params.anneal_time_ns) / 1000.0;
        if params.kind == ProblemKind::ZeroNoise {
            let lambda = compute_lambda(
                params.coupling_strength,
                &self.schedule.schedule,
                self.config.j_baseline,
            )?;
            // Classical dynamics have no schedule to compensate.
            if !sampler.is_classical() {
                anneal_time_us *= lambda;
            }
            self.job.lambda = Some(lambda);
        }

        let sample_params = SampleParams::new(anneal_time_us, self.config.num_reads)
            .with_label(submission_label(&submitted_at));
        let job_id = sampler.submit(&problem, &sample_params).await?;
        info!(
            "Submitted job {} ({} spins, {:.4} us)",
            job_id, params.ring_size, anneal_time_us
        );
        self.job.id = Some(job_id);
        Ok(())
    }

    async fn collect_results(&mut self, sampler: &dyn Sampler) -> SchedResult<()> {
        let (Some(job_id), Some(params)) = (self.job.id.clone(), self.job.params) else {
            return Err(SchedError::InvalidJobState {
                expected: "submitted job".into(),
                found: "no job record".into(),
            });
        };
        let raw = sampler.samples(&job_id).await?;
        let samples = self.logical_samples(sampler, &raw, params.ring_size)?;
        let stats = kink_stats(&samples, params.coupling_strength)?;
        let representative = stats
            .representative_index()
            .and_then(|i| samples.sample(i))
            .map(|row| row.to_vec())
            .unwrap_or_default();
        info!(
            "Job {} kink density {:.4}",
            job_id, stats.mean_kink_density
        );

        let lambda = match params.kind {
            ProblemKind::KibbleZurek => {
                self.kz_points.push(KzPoint {
                    anneal_time_ns: f64::from(params.anneal_time_ns),
                    kink_density: stats.mean_kink_density,
                    coupling_strength: params.coupling_strength,
                });
                None
            }
            ProblemKind::ZeroNoise => {
                let lambda = match self.job.lambda {
                    Some(l) => l,
                    None => compute_lambda(
                        params.coupling_strength,
                        &self.schedule.schedule,
                        self.config.j_baseline,
                    )?,
                };
                let outcome = self.history.accumulate_and_refit(
                    params.anneal_time_ns,
                    CouplingObservation {
                        lambda,
                        kink_density: stats.mean_kink_density,
                        coupling_strength: params.coupling_strength,
                    },
                );
                self.error_modal = outcome.show_error_modal;
                if let Some(curve) = outcome.curve {
                    self.zne_estimates
                        .insert(params.anneal_time_ns, curve.zero_noise_estimate());
                }
                if let Some(failure) = outcome.failure {
                    self.last_error = Some(failure);
                }
                Some(lambda)
            }
        };

        self.last_result = Some(JobResult {
            stats,
            representative,
            coupling_strength: params.coupling_strength,
            lambda,
        });
        Ok(())
    }

    fn logical_samples(
        &self,
        sampler: &dyn Sampler,
        raw: &SampleSet,
        ring_size: usize,
    ) -> SchedResult<SampleSet> {
        if sampler.is_classical() {
            let spins: Vec<u32> = (0..ring_size as u32).collect();
            return Ok(raw.select(&spins)?);
        }
        self.cache
            .get(ring_size)
            .ok_or(SchedError::EmbeddingNotFound(ring_size))?
            .unembed(raw)
    }

    /// Figure for the current display.
    pub fn figure(&self) -> Figure {
        build_figure(&FigureInput {
            display: self.params.display,
            kind: self.params.kind,
            schedule: &self.schedule.schedule,
            coupling_strength: self.params.coupling_strength,
            j_baseline: self.config.j_baseline,
            anneal_range_ns: self.anneal_range_ns(self.params.kind),
            theory_points: self.config.theory_points,
            kz_points: &self.kz_points,
            history: &self.history,
            zne_estimates: &self.zne_estimates,
        })
    }

    fn anneal_range_ns(&self, kind: ProblemKind) -> (f64, f64) {
        let range = self.config.anneal_time_ns;
        match kind {
            ProblemKind::KibbleZurek => (range.min, range.max_kz),
            ProblemKind::ZeroNoise => (range.min, range.max_zne),
        }
    }

    /// Lock parameter inputs while a submission is running.
    pub fn disable_inputs(&self) -> bool {
        self.job.state.is_running()
    }

    /// Dismiss the error dialog.
    pub fn dismiss_error_modal(&mut self) {
        self.error_modal = false;
    }

    /// Current state.
    pub fn state(&self) -> SubmitState {
        self.job.state
    }

    pub fn job(&self) -> &JobRecord {
        &self.job
    }

    pub fn timer(&self) -> PollTimer {
        self.timer
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SamplerRegistry {
        &self.registry
    }

    /// Name of the selected sampler.
    pub fn sampler_name(&self) -> Option<&str> {
        self.sampler.as_deref().map(|s| s.name())
    }

    pub fn schedule(&self) -> &ScheduleSelection {
        &self.schedule
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn history(&self) -> &ObservationHistory {
        &self.history
    }

    pub fn zne_estimates(&self) -> &BTreeMap<u32, f64> {
        &self.zne_estimates
    }

    pub fn kz_points(&self) -> &[KzPoint] {
        &self.kz_points
    }

    pub fn signal(&self) -> Option<&EmbeddingSignal> {
        self.signal.as_ref()
    }

    pub fn last_result(&self) -> Option<&JobResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn error_modal(&self) -> bool {
        self.error_modal
    }

    pub fn no_solver(&self) -> bool {
        self.no_solver
    }

    /// Shown once, on the first submission to a classical sampler.
    pub fn classical_warning(&self) -> bool {
        self.classical_warning
    }

    /// Serializable view for the client.
    pub fn snapshot(&self) -> SessionSnapshot {
        let (percent, colour) = self.job.state.progress();
        SessionSnapshot {
            sampler: self.sampler_name().map(str::to_string),
            classical: self.sampler.as_ref().is_some_and(|s| s.is_classical()),
            schedule_file: self.schedule.file_name.clone(),
            schedule_match: self.schedule.quality,
            state: self.job.state,
            progress: (percent, colour.to_string()),
            submit_disabled: self.submit_disabled,
            inputs_disabled: self.disable_inputs(),
            timer: self.timer,
            job_id: self.job.id.clone(),
            submitted_at: self.job.submitted_at,
            embedding_signal: self.signal.as_ref().map(|s| {
                match s {
                    EmbeddingSignal::Needed => "needed",
                    EmbeddingSignal::NotFound => "not_found",
                    EmbeddingSignal::Found { .. } => "found",
                }
                .to_string()
            }),
            cached_ring_sizes: self.cache.ring_sizes(),
            params: self.params,
            error_modal: self.error_modal,
            no_solver: self.no_solver,
            classical_warning: self.classical_warning,
            kink_density: self.last_result.as_ref().map(|r| r.stats.mean_kink_density),
            lambda: self.last_result.as_ref().and_then(|r| r.lambda),
            zne_estimates: self.zne_estimates.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
