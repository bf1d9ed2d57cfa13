//! Lifecycle state machine tests.
//!
//! Every transition is driven through `step` with stub embedding finders
//! and status sources, so no sampler or network is involved.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use kz_hal::{HalError, HalResult, JobId, JobStatus, SubmitTime};
use kz_sched::{
    Embedding, EmbeddingFinder, EmbeddingSignal, PollingConfig, SchedError, SchedResult,
    StatusSource, StepInput, StepOutput, SubmitState, Trigger, step,
};

/// Finder answering with a fixed embedding or failure.
enum StubFinder {
    Found(Embedding),
    Empty,
    Fails,
}

#[async_trait]
impl EmbeddingFinder for StubFinder {
    async fn find(&self, ring_size: usize, _edges: &[(u32, u32)]) -> SchedResult<Embedding> {
        match self {
            StubFinder::Found(emb) => Ok(emb.clone()),
            StubFinder::Empty => Ok(Embedding::new()),
            StubFinder::Fails => Err(SchedError::EmbeddingTimeout {
                ring_size,
                secs: 60.0,
            }),
        }
    }
}

/// Status source knowing a single job.
struct StubStatus {
    job: &'static str,
    status: JobStatus,
    submitted_at: SubmitTime,
}

#[async_trait]
impl StatusSource for StubStatus {
    async fn job_status(
        &self,
        job_id: &JobId,
        submitted_at: &SubmitTime,
    ) -> HalResult<Option<JobStatus>> {
        if job_id.as_str() == self.job && *submitted_at == self.submitted_at {
            Ok(Some(self.status))
        } else {
            Ok(None)
        }
    }
}

struct BrokenStatus;

#[async_trait]
impl StatusSource for BrokenStatus {
    async fn job_status(&self, _: &JobId, _: &SubmitTime) -> HalResult<Option<JobStatus>> {
        Err(HalError::Timeout("status endpoint".into()))
    }
}

fn submit_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn status_stub(status: JobStatus) -> StubStatus {
    StubStatus {
        job: "2",
        status,
        submitted_at: submit_time(),
    }
}

fn base_input(trigger: Trigger, state: SubmitState) -> StepInput<'static> {
    StepInput {
        trigger,
        state,
        job_id: None,
        submitted_at: None,
        ring_size: 512,
        embedding_cached: false,
        classical: false,
        signal: None,
        device_edges: &[(10, 11), (11, 12), (12, 10)],
        now: submit_time() + Duration::seconds(30),
    }
}

async fn run(input: StepInput<'_>, finder: &StubFinder, status: &dyn StatusSource) -> StepOutput {
    step(input, finder, status, &PollingConfig::default()).await
}

// ----------------------------------------------------------------------------
// Submit
// ----------------------------------------------------------------------------

#[tokio::test]
async fn submit_with_cached_embedding_goes_to_submitted() {
    let mut input = base_input(Trigger::Submit, SubmitState::Ready);
    input.embedding_cached = true;

    let out = run(input, &StubFinder::Empty, &status_stub(JobStatus::Pending)).await;

    assert_eq!(out.submit_disabled, Some(true));
    assert_eq!(out.timer_disabled, Some(false));
    assert!(out.reset_ticks);
    assert_eq!(out.state, Some(SubmitState::Submitted));
    assert_eq!(out.submitted_at, Some(input.now));
    assert_eq!(out.interval_ms, Some(500));
    assert_eq!(out.signal, None);
}

#[tokio::test]
async fn submit_without_embedding_requests_search() {
    let mut input = base_input(Trigger::Submit, SubmitState::Completed);
    input.ring_size = 2048;

    let out = run(input, &StubFinder::Empty, &status_stub(JobStatus::Pending)).await;

    assert_eq!(out.state, Some(SubmitState::Embedding));
    assert_eq!(out.signal, Some(EmbeddingSignal::Needed));
    assert_eq!(out.submitted_at, None);
    assert_eq!(out.submit_disabled, Some(true));
}

#[tokio::test]
async fn submit_to_classical_needs_no_embedding() {
    let mut input = base_input(Trigger::Submit, SubmitState::Failed);
    input.classical = true;

    let out = run(input, &StubFinder::Fails, &status_stub(JobStatus::Pending)).await;

    assert_eq!(out.state, Some(SubmitState::Submitted));
    assert!(out.submitted_at.is_some());
}

// ----------------------------------------------------------------------------
// Embedding
// ----------------------------------------------------------------------------

#[tokio::test]
async fn found_embedding_stays_in_embedding_for_one_tick() {
    let emb = Embedding::from_one_to_one([(0, 10), (1, 11), (2, 12)]);
    let mut input = base_input(Trigger::PollTick, SubmitState::Embedding);
    input.ring_size = 3;
    input.signal = Some(&EmbeddingSignal::Needed);

    let out = run(input, &StubFinder::Found(emb.clone()), &status_stub(JobStatus::Pending)).await;

    assert_eq!(out.state, Some(SubmitState::Embedding));
    assert_eq!(out.interval_ms, Some(200));
    assert!(out.reset_ticks);
    assert_eq!(
        out.signal,
        Some(EmbeddingSignal::Found {
            ring_size: 3,
            embedding: emb,
        })
    );
    assert_eq!(out.submitted_at, None);
    // Controls are left as they are.
    assert_eq!(out.submit_disabled, None);
    assert_eq!(out.timer_disabled, None);
}

#[tokio::test]
async fn tick_after_found_embedding_submits() {
    let found = EmbeddingSignal::Found {
        ring_size: 3,
        embedding: Embedding::from_one_to_one([(0, 10), (1, 11), (2, 12)]),
    };
    let mut input = base_input(Trigger::PollTick, SubmitState::Embedding);
    input.signal = Some(&found);

    let out = run(input, &StubFinder::Fails, &status_stub(JobStatus::Pending)).await;

    assert_eq!(out.state, Some(SubmitState::Submitted));
    assert_eq!(out.submitted_at, Some(input.now));
    assert_eq!(out.interval_ms, Some(200));
    assert!(!out.reset_ticks);
    assert_eq!(out.signal, None);
}

#[tokio::test]
async fn empty_embedding_fails() {
    let mut input = base_input(Trigger::PollTick, SubmitState::Embedding);
    input.signal = Some(&EmbeddingSignal::Needed);

    let out = run(input, &StubFinder::Empty, &status_stub(JobStatus::Pending)).await;

    assert_eq!(out.state, Some(SubmitState::Failed));
    assert_eq!(out.signal, Some(EmbeddingSignal::NotFound));
    assert_eq!(out.submit_disabled, Some(false));
    assert_eq!(out.timer_disabled, Some(true));
}

#[tokio::test]
async fn search_error_fails_without_retry() {
    let mut input = base_input(Trigger::PollTick, SubmitState::Embedding);
    input.signal = Some(&EmbeddingSignal::Needed);

    let out = run(input, &StubFinder::Fails, &status_stub(JobStatus::Pending)).await;

    assert_eq!(out.state, Some(SubmitState::Failed));
    assert_eq!(out.signal, Some(EmbeddingSignal::NotFound));
    assert_eq!(out.interval_ms, None);
}

// ----------------------------------------------------------------------------
// Polling
// ----------------------------------------------------------------------------

#[tokio::test]
async fn in_progress_job_completes() {
    let job = JobId::new("2");
    let mut input = base_input(Trigger::PollTick, SubmitState::InProgress);
    input.job_id = Some(&job);
    input.submitted_at = Some(submit_time());

    let out = run(input, &StubFinder::Empty, &status_stub(JobStatus::Completed)).await;

    assert_eq!(out.state, Some(SubmitState::Completed));
    assert_eq!(out.interval_ms, Some(1000));
    assert!(out.reset_ticks);
    // The next tick in the terminal state re-enables submission.
    let mut next = base_input(Trigger::PollTick, SubmitState::Completed);
    next.job_id = Some(&job);
    let done = run(next, &StubFinder::Empty, &status_stub(JobStatus::Completed)).await;
    assert_eq!(done.submit_disabled, Some(false));
    assert_eq!(done.timer_disabled, Some(true));
    assert_eq!(done.interval_ms, Some(100));
    assert_eq!(done.state, None);
}

#[tokio::test]
async fn stale_submission_time_keeps_waiting() {
    let job = JobId::new("2");
    let mut input = base_input(Trigger::PollTick, SubmitState::Pending);
    input.job_id = Some(&job);
    input.submitted_at = Some(submit_time() - Duration::minutes(5));

    let out = run(input, &StubFinder::Empty, &status_stub(JobStatus::Completed)).await;

    assert_eq!(out.state, Some(SubmitState::Submitted));
    assert_eq!(out.interval_ms, Some(200));
}

#[tokio::test]
async fn status_error_is_treated_as_not_found() {
    let job = JobId::new("2");
    let mut input = base_input(Trigger::PollTick, SubmitState::Submitted);
    input.job_id = Some(&job);
    input.submitted_at = Some(submit_time());

    let out = run(input, &StubFinder::Empty, &BrokenStatus).await;

    assert_eq!(out.state, Some(SubmitState::Submitted));
    assert_eq!(out.interval_ms, Some(200));
    assert_eq!(out.submit_disabled, None);
}

#[tokio::test]
async fn cancelled_and_failed_statuses_are_reported() {
    for (status, expected) in [
        (JobStatus::Cancelled, SubmitState::Cancelled),
        (JobStatus::Failed, SubmitState::Failed),
        (JobStatus::Pending, SubmitState::Pending),
    ] {
        let job = JobId::new("2");
        let mut input = base_input(Trigger::PollTick, SubmitState::Submitted);
        input.job_id = Some(&job);
        input.submitted_at = Some(submit_time());
        let out = run(input, &StubFinder::Empty, &status_stub(status)).await;
        assert_eq!(out.state, Some(expected));
    }
}

#[tokio::test]
async fn tick_in_no_solver_state_is_error() {
    let out = run(
        base_input(Trigger::PollTick, SubmitState::NoSolver),
        &StubFinder::Empty,
        &status_stub(JobStatus::Pending),
    )
    .await;
    assert_eq!(out.state, Some(SubmitState::Error));
    assert_eq!(out.interval_ms, Some(0));
    assert!(out.reset_ticks);
    assert_eq!(out.timer_disabled, Some(true));
}
