//! Session integration tests.
//!
//! These run complete submissions against an in-process mock sampler,
//! using the real cycle search and the in-memory or JSON repositories.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kz_hal::{
    HalError, HalResult, IsingProblem, JobId, JobStatus, SampleParams, SampleSet, Sampler,
    SamplerProperties, SamplerRegistry, SubmitTime, Topology, label_matches,
};
use kz_sched::{
    Config, CycleSearchFinder, Embedding, EmbeddingCache, EmbeddingRepository,
    JsonEmbeddingStore, MemoryEmbeddingStore, ParameterUpdate, ProblemKind, SchedError, Session,
    SubmitState,
};
use ndarray::Array2;

/// Sampler returning all-up spins for every submitted job.
struct MockSampler {
    properties: SamplerProperties,
    jobs: Mutex<Vec<(IsingProblem, SampleParams)>>,
}

impl MockSampler {
    fn quantum(name: &str) -> Arc<Self> {
        Arc::new(Self {
            properties: SamplerProperties::quantum(name, Topology::torus(4, 4), (0.001, 2.0)),
            jobs: Mutex::new(Vec::new()),
        })
    }

    fn classical(name: &str) -> Arc<Self> {
        Arc::new(Self {
            properties: SamplerProperties::classical(name, Topology::torus(4, 4)),
            jobs: Mutex::new(Vec::new()),
        })
    }

    fn submitted(&self) -> Vec<SampleParams> {
        self.jobs.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl Sampler for MockSampler {
    fn name(&self) -> &str {
        &self.properties.name
    }

    fn properties(&self) -> &SamplerProperties {
        &self.properties
    }

    async fn submit(&self, problem: &IsingProblem, params: &SampleParams) -> HalResult<JobId> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push((problem.clone(), params.clone()));
        Ok(JobId::new(format!("job-{}", jobs.len())))
    }

    async fn status(&self, job_id: &JobId, submitted_at: &SubmitTime) -> HalResult<Option<JobStatus>> {
        let jobs = self.jobs.lock().unwrap();
        let index = job_id
            .as_str()
            .trim_start_matches("job-")
            .parse::<usize>()
            .map_err(|e| HalError::JobNotFound(e.to_string()))?;
        Ok(jobs
            .get(index - 1)
            .filter(|(_, p)| label_matches(&p.label, submitted_at))
            .map(|_| JobStatus::Completed))
    }

    async fn samples(&self, job_id: &JobId) -> HalResult<SampleSet> {
        let jobs = self.jobs.lock().unwrap();
        let (problem, params) = jobs
            .last()
            .ok_or_else(|| HalError::JobNotFound(job_id.to_string()))?;
        let variables = problem.variables();
        let record = Array2::from_elem((params.num_reads as usize, variables.len()), 1i8);
        SampleSet::new(variables, record, vec![])
    }
}

fn session_with(sampler: Arc<MockSampler>, repository: Arc<dyn EmbeddingRepository>) -> Session {
    let mut registry = SamplerRegistry::new();
    registry.register(sampler);
    let config = Config {
        num_reads: 10,
        ..Config::default()
    };
    Session::new(
        config,
        registry,
        repository,
        Arc::new(CycleSearchFinder::new(Duration::from_secs(5))),
    )
}

async fn run_to_completion(session: &mut Session) -> Vec<SubmitState> {
    let mut states = vec![session.submit().await.unwrap()];
    for _ in 0..10 {
        if session.timer().disabled {
            break;
        }
        states.push(session.tick().await.unwrap());
    }
    states
}

// ----------------------------------------------------------------------------
// Full cycles
// ----------------------------------------------------------------------------

#[tokio::test]
async fn quantum_cycle_embeds_submits_and_evaluates() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonEmbeddingStore::new(dir.path()).await.unwrap());
    let sampler = MockSampler::quantum("qpu_a.1");
    let mut session = session_with(sampler.clone(), store.clone());
    session.start().await.unwrap();
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(8),
            ..Default::default()
        })
        .unwrap();

    let states = run_to_completion(&mut session).await;
    assert_eq!(
        states,
        vec![
            SubmitState::Embedding,
            SubmitState::Embedding,
            SubmitState::Submitted,
            SubmitState::Completed,
            SubmitState::Completed,
        ]
    );

    // The discovered embedding is cached and persisted.
    assert!(session.cache().contains(8));
    let saved = store.load("qpu_a.1").await.unwrap();
    assert!(saved.contains(8));

    // The problem went out on physical qubits with the ns → µs conversion.
    let submitted = sampler.submitted();
    assert_eq!(submitted.len(), 1);
    assert!((submitted[0].annealing_time_us - 0.007).abs() < 1e-12);
    assert!(submitted[0].label.starts_with(kz_hal::job::LABEL_PREFIX));

    let result = session.last_result().unwrap();
    assert_eq!(result.stats.mean_kink_density, 0.0);
    assert_eq!(result.representative, vec![1; 8]);
    assert_eq!(result.coupling_strength, -1.4);
    assert_eq!(session.kz_points().len(), 1);
    assert!(!session.disable_inputs());
    assert!(!session.snapshot().submit_disabled);
}

#[tokio::test]
async fn cached_embedding_skips_search() {
    let cache: EmbeddingCache = serde_json::from_str(
        r#"{"4": {"0": [0], "1": [1], "2": [5], "3": [4]}}"#,
    )
    .unwrap();
    let store = Arc::new(MemoryEmbeddingStore::with_cache("qpu_a.1", cache));
    let mut session = session_with(MockSampler::quantum("qpu_a.1"), store);
    session.start().await.unwrap();
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(4),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(session.submit().await.unwrap(), SubmitState::Submitted);
    assert!(session.job().id.is_some());
}

#[tokio::test]
async fn embedding_search_keeps_previous_submission_time() {
    let cache: EmbeddingCache = serde_json::from_str(
        r#"{"4": {"0": [0], "1": [1], "2": [5], "3": [4]}}"#,
    )
    .unwrap();
    let store = Arc::new(MemoryEmbeddingStore::with_cache("qpu_a.1", cache));
    let mut session = session_with(MockSampler::quantum("qpu_a.1"), store);
    session.start().await.unwrap();
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(4),
            ..Default::default()
        })
        .unwrap();
    run_to_completion(&mut session).await;
    assert_eq!(session.state(), SubmitState::Completed);
    let previous = session.job().submitted_at;
    assert!(previous.is_some());

    // No embedding for 8 spins is cached, so the submit only starts a search.
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(8),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(session.submit().await.unwrap(), SubmitState::Embedding);
    assert_eq!(session.job().submitted_at, previous);
    assert_eq!(session.snapshot().submitted_at, previous);

    // The next tick finds the embedding; the one after submits with a new time.
    session.tick().await.unwrap();
    assert_eq!(session.job().submitted_at, previous);
    assert_eq!(session.tick().await.unwrap(), SubmitState::Submitted);
    assert_ne!(session.job().submitted_at, previous);
}

#[tokio::test]
async fn classical_cycle_needs_no_embedding() {
    let sampler = MockSampler::classical("Diffusion [Classical]");
    let mut session = session_with(sampler.clone(), Arc::new(MemoryEmbeddingStore::new()));
    session.start().await.unwrap();
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(64),
            ..Default::default()
        })
        .unwrap();

    let states = run_to_completion(&mut session).await;
    assert_eq!(states[0], SubmitState::Submitted);
    assert_eq!(session.state(), SubmitState::Completed);
    assert!(session.cache().is_empty());
    assert!(session.classical_warning());

    // The warning is shown on the first classical submission only.
    run_to_completion(&mut session).await;
    assert!(!session.classical_warning());
    assert_eq!(session.kz_points().len(), 2);
}

// ----------------------------------------------------------------------------
// Zero-noise extrapolation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn zero_noise_runs_scale_anneal_time_and_refit() {
    let sampler = MockSampler::quantum("qpu_a.1");
    let mut session = session_with(sampler.clone(), Arc::new(MemoryEmbeddingStore::new()));
    session.start().await.unwrap();
    let baseline = session.config().j_baseline;
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(8),
            coupling_strength: Some(baseline),
            anneal_time_ns: Some(20),
            kind: Some(ProblemKind::ZeroNoise),
            ..Default::default()
        })
        .unwrap();

    run_to_completion(&mut session).await;
    assert_eq!(session.last_result().unwrap().lambda, Some(1.0));
    assert!(!session.error_modal());

    // A second run at the same λ makes the fit rank deficient.
    run_to_completion(&mut session).await;
    assert!(session.error_modal());
    assert_eq!(session.history().bucket(20).len(), 2);
    assert!(session.zne_estimates().is_empty());

    // A different coupling adds a distinct λ and the fit recovers.
    session
        .set_parameters(ParameterUpdate {
            coupling_strength: Some(-1.0),
            ..Default::default()
        })
        .unwrap();
    run_to_completion(&mut session).await;
    assert!(!session.error_modal());
    assert_eq!(session.history().bucket(20).len(), 3);
    assert!(session.zne_estimates().contains_key(&20));

    let submitted = sampler.submitted();
    let lambda = session.last_result().unwrap().lambda.unwrap();
    assert!((submitted[2].annealing_time_us - 0.020 * lambda).abs() < 1e-12);
}

#[tokio::test]
async fn classical_zero_noise_runs_are_not_rescaled() {
    let sampler = MockSampler::classical("Diffusion [Classical]");
    let mut session = session_with(sampler.clone(), Arc::new(MemoryEmbeddingStore::new()));
    session.start().await.unwrap();
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(16),
            coupling_strength: Some(-1.0),
            anneal_time_ns: Some(20),
            kind: Some(ProblemKind::ZeroNoise),
            ..Default::default()
        })
        .unwrap();

    run_to_completion(&mut session).await;
    let lambda = session.last_result().unwrap().lambda.unwrap();
    assert!(lambda != 1.0);
    assert!((sampler.submitted()[0].annealing_time_us - 0.020).abs() < 1e-12);
    assert_eq!(session.history().bucket(20)[0].lambda, lambda);
}

// ----------------------------------------------------------------------------
// Configuration changes and guards
// ----------------------------------------------------------------------------

#[tokio::test]
async fn no_sampler_surfaces_no_solver() {
    let mut session = Session::new(
        Config::default(),
        SamplerRegistry::new(),
        Arc::new(MemoryEmbeddingStore::new()),
        Arc::new(CycleSearchFinder::new(Duration::from_secs(1))),
    );
    session.start().await.unwrap();
    assert_eq!(session.state(), SubmitState::NoSolver);

    assert_eq!(session.submit().await.unwrap(), SubmitState::NoSolver);
    assert!(session.no_solver());
    assert!(session.snapshot().no_solver);
}

#[tokio::test]
async fn selecting_sampler_prunes_stale_embeddings() {
    let mut cache = EmbeddingCache::new();
    // Qubits 0..4 form a 4-cycle on the 4x4 torus; 0, 5, 10 are not coupled.
    cache.merge_discovered(4, Embedding::from_cycle(&[0, 1, 5, 4]));
    cache.merge_discovered(3, Embedding::from_cycle(&[0, 5, 10]));
    let store = Arc::new(MemoryEmbeddingStore::with_cache("qpu_a.1", cache));

    let mut session = session_with(MockSampler::quantum("qpu_a.1"), store);
    session.select_sampler("qpu_a.1").await.unwrap();

    assert_eq!(session.cache().ring_sizes(), vec![4]);
}

#[tokio::test]
async fn unknown_sampler_is_rejected() {
    let mut session = session_with(MockSampler::quantum("qpu_a.1"), Arc::new(MemoryEmbeddingStore::new()));
    assert!(matches!(
        session.select_sampler("qpu_b.2").await,
        Err(SchedError::SamplerNotFound(_))
    ));
}

#[tokio::test]
async fn parameter_changes_clear_results() {
    let sampler = MockSampler::classical("Diffusion [Classical]");
    let mut session = session_with(sampler, Arc::new(MemoryEmbeddingStore::new()));
    session.start().await.unwrap();

    run_to_completion(&mut session).await;
    assert_eq!(session.kz_points().len(), 1);

    session
        .set_parameters(ParameterUpdate {
            anneal_time_ns: Some(50),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(session.kz_points().len(), 1);

    session
        .set_parameters(ParameterUpdate {
            coupling_strength: Some(-0.8),
            ..Default::default()
        })
        .unwrap();
    assert!(session.kz_points().is_empty());
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    let mut session = session_with(
        MockSampler::classical("Diffusion [Classical]"),
        Arc::new(MemoryEmbeddingStore::new()),
    );
    session.start().await.unwrap();

    assert!(matches!(
        session.set_parameters(ParameterUpdate {
            ring_size: Some(2),
            ..Default::default()
        }),
        Err(SchedError::InvalidRingSize(2))
    ));
    assert!(matches!(
        session.set_parameters(ParameterUpdate {
            anneal_time_ns: Some(1000),
            ..Default::default()
        }),
        Err(SchedError::InvalidParameter { name: "anneal_time_ns", .. })
    ));
    assert_eq!(session.params().ring_size, 512);
}

#[tokio::test]
async fn parameters_are_locked_while_running() {
    let mut session = session_with(MockSampler::quantum("qpu_a.1"), Arc::new(MemoryEmbeddingStore::new()));
    session.start().await.unwrap();
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(8),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(session.submit().await.unwrap(), SubmitState::Embedding);
    assert!(session.disable_inputs());
    assert!(matches!(
        session.set_parameters(ParameterUpdate {
            ring_size: Some(6),
            ..Default::default()
        }),
        Err(SchedError::InvalidJobState { .. })
    ));
    assert!(session.submit().await.is_err());
}

#[tokio::test]
async fn ring_too_long_for_device_fails_embedding() {
    let mut session = session_with(MockSampler::quantum("qpu_a.1"), Arc::new(MemoryEmbeddingStore::new()));
    session.start().await.unwrap();
    session
        .set_parameters(ParameterUpdate {
            ring_size: Some(32),
            ..Default::default()
        })
        .unwrap();

    let states = run_to_completion(&mut session).await;
    assert_eq!(states, vec![SubmitState::Embedding, SubmitState::Failed]);
    assert_eq!(session.snapshot().embedding_signal.as_deref(), Some("not_found"));
    assert!(!session.snapshot().submit_disabled);
}
