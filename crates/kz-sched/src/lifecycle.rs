//! Job lifecycle state machine.
//!
//! One submission moves through
//!
//! ```text
//!   READY ──submit──→ EMBEDDING ──found──→ EMBEDDING ──tick──→ SUBMITTED
//!     │                   │                                      │
//!     │                   └──not found──→ FAILED                 ▼
//!     └──submit (cached / classical)──────────────────→ SUBMITTED/PENDING/IN_PROGRESS
//!                                                                │
//!                                                                ▼
//!                                                  COMPLETED / CANCELLED / FAILED
//! ```
//!
//! [`step`] is a pure transition: it takes the current state and one
//! trigger (a submit click or a poll-timer tick) and returns the updates
//! for the UI. The embedding search and the status query are injected, so
//! the step never touches files or the network directly.
//!
//! Every field of [`StepOutput`] is optional; `None` means "leave as is".

use std::fmt;

use async_trait::async_trait;
use kz_hal::{HalResult, JobId, JobStatus, Sampler, SubmitTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::embedding::{Embedding, EmbeddingFinder};

/// State of the current submission as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmitState {
    /// No sampler is reachable.
    #[serde(rename = "NO SOLVER")]
    NoSolver,
    /// Idle, ready to submit.
    #[serde(rename = "READY")]
    Ready,
    /// Searching for or caching an embedding.
    #[serde(rename = "EMBEDDING")]
    Embedding,
    /// Handed to the sampler; no status seen yet.
    #[serde(rename = "SUBMITTED")]
    Submitted,
    /// Queued on the sampler.
    #[serde(rename = "PENDING")]
    Pending,
    /// Running on the sampler.
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    /// Samples are available.
    #[serde(rename = "COMPLETED")]
    Completed,
    /// Cancelled on the sampler.
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// Embedding, submission or execution failed.
    #[serde(rename = "FAILED")]
    Failed,
    /// Unexpected input; indicates a logic defect.
    #[serde(rename = "ERROR")]
    Error,
}

impl SubmitState {
    /// Label shown in the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSolver => "NO SOLVER",
            Self::Ready => "READY",
            Self::Embedding => "EMBEDDING",
            Self::Submitted => "SUBMITTED",
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
        }
    }

    /// States in which inputs are locked.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Embedding | Self::Submitted | Self::Pending | Self::InProgress
        )
    }

    /// States that end a submission.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// States in which the sampler is polled.
    pub fn is_polling(&self) -> bool {
        matches!(self, Self::Submitted | Self::Pending | Self::InProgress)
    }

    /// Progress-bar value (percent) and colour.
    pub fn progress(&self) -> (u8, &'static str) {
        match self {
            Self::NoSolver => (100, "danger"),
            Self::Ready => (0, "info"),
            Self::Embedding => (20, "info"),
            Self::Submitted => (40, "info"),
            Self::Pending => (60, "info"),
            Self::InProgress => (85, "info"),
            Self::Completed => (100, "success"),
            Self::Cancelled => (100, "light"),
            Self::Failed => (100, "danger"),
            Self::Error => (100, "danger"),
        }
    }
}

impl fmt::Display for SubmitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<JobStatus> for SubmitState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => Self::Pending,
            JobStatus::InProgress => Self::InProgress,
            JobStatus::Completed => Self::Completed,
            JobStatus::Cancelled => Self::Cancelled,
            JobStatus::Failed => Self::Failed,
        }
    }
}

/// What caused a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// The user pressed submit.
    Submit,
    /// The poll timer fired.
    PollTick,
}

/// Embedding progress reported to the UI and fed back on the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingSignal {
    /// A search must run on the next tick.
    Needed,
    /// The search failed.
    NotFound,
    /// A search succeeded; the embedding must be cached.
    Found {
        /// Ring size the embedding is for.
        ring_size: usize,
        /// The discovered embedding.
        embedding: Embedding,
    },
}

/// Source of job status for polling.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Status of `job_id` if it was submitted at `submitted_at`; `None`
    /// when no matching record exists.
    async fn job_status(
        &self,
        job_id: &JobId,
        submitted_at: &SubmitTime,
    ) -> HalResult<Option<JobStatus>>;
}

/// Polls a [`Sampler`].
pub struct SamplerStatus<'a>(pub &'a dyn Sampler);

#[async_trait]
impl StatusSource for SamplerStatus<'_> {
    async fn job_status(
        &self,
        job_id: &JobId,
        submitted_at: &SubmitTime,
    ) -> HalResult<Option<JobStatus>> {
        self.0.status(job_id, submitted_at).await
    }
}

/// Inputs of one transition.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    /// What fired.
    pub trigger: Trigger,
    /// Current state.
    pub state: SubmitState,
    /// Job of the current submission, once submitted.
    pub job_id: Option<&'a JobId>,
    /// Submission time of the current job.
    pub submitted_at: Option<SubmitTime>,
    /// Requested ring size.
    pub ring_size: usize,
    /// An embedding for `ring_size` is cached.
    pub embedding_cached: bool,
    /// The selected sampler needs no embedding.
    pub classical: bool,
    /// Signal produced by the previous step.
    pub signal: Option<&'a EmbeddingSignal>,
    /// Coupling graph of the selected sampler.
    pub device_edges: &'a [(u32, u32)],
    /// Current wall-clock time.
    pub now: SubmitTime,
}

/// Updates produced by one transition. `None` leaves a value unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutput {
    /// Disable the submit control.
    pub submit_disabled: Option<bool>,
    /// Disable the poll timer.
    pub timer_disabled: Option<bool>,
    /// New poll interval in milliseconds.
    pub interval_ms: Option<u64>,
    /// Reset the poll timer's tick counter.
    pub reset_ticks: bool,
    /// New state.
    pub state: Option<SubmitState>,
    /// New submission time; a job must be submitted with it.
    pub submitted_at: Option<SubmitTime>,
    /// New embedding signal.
    pub signal: Option<EmbeddingSignal>,
}

impl StepOutput {
    fn stopped(state: Option<SubmitState>) -> Self {
        Self {
            submit_disabled: Some(false),
            timer_disabled: Some(true),
            state,
            ..Self::default()
        }
    }
}

/// Run one transition of the lifecycle.
pub async fn step(
    input: StepInput<'_>,
    finder: &dyn EmbeddingFinder,
    status: &dyn StatusSource,
    polling: &PollingConfig,
) -> StepOutput {
    match input.trigger {
        Trigger::Submit => on_submit(&input, polling),
        Trigger::PollTick => match input.state {
            SubmitState::Embedding => on_embedding_tick(&input, finder, polling).await,
            s if s.is_polling() => on_poll_tick(&input, status, polling).await,
            s if s.is_terminal() => StepOutput {
                interval_ms: Some(polling.done_ms),
                ..StepOutput::stopped(None)
            },
            other => {
                warn!("Poll tick in unexpected state {}", other);
                StepOutput {
                    interval_ms: Some(0),
                    reset_ticks: true,
                    ..StepOutput::stopped(Some(SubmitState::Error))
                }
            }
        },
    }
}

fn on_submit(input: &StepInput<'_>, polling: &PollingConfig) -> StepOutput {
    let base = StepOutput {
        submit_disabled: Some(true),
        timer_disabled: Some(false),
        interval_ms: Some(polling.submit_ms),
        reset_ticks: true,
        ..StepOutput::default()
    };
    if input.embedding_cached || input.classical {
        info!("Submitting {} spins", input.ring_size);
        StepOutput {
            state: Some(SubmitState::Submitted),
            submitted_at: Some(input.now),
            ..base
        }
    } else {
        info!("No cached embedding for {} spins; searching", input.ring_size);
        StepOutput {
            state: Some(SubmitState::Embedding),
            signal: Some(EmbeddingSignal::Needed),
            ..base
        }
    }
}

async fn on_embedding_tick(
    input: &StepInput<'_>,
    finder: &dyn EmbeddingFinder,
    polling: &PollingConfig,
) -> StepOutput {
    if input.signal != Some(&EmbeddingSignal::Needed) {
        // The embedding found on the previous tick is cached by now.
        info!("Embedding cached; submitting {} spins", input.ring_size);
        return StepOutput {
            interval_ms: Some(polling.embedding_ms),
            state: Some(SubmitState::Submitted),
            submitted_at: Some(input.now),
            ..StepOutput::default()
        };
    }

    match finder.find(input.ring_size, input.device_edges).await {
        Ok(embedding) if !embedding.is_empty() => {
            info!("Found embedding for {} spins", input.ring_size);
            StepOutput {
                interval_ms: Some(polling.embedding_ms),
                reset_ticks: true,
                state: Some(SubmitState::Embedding),
                signal: Some(EmbeddingSignal::Found {
                    ring_size: input.ring_size,
                    embedding,
                }),
                ..StepOutput::default()
            }
        }
        result => {
            match result {
                Err(e) => warn!("Embedding search failed: {}", e),
                Ok(_) => warn!("Embedding search returned nothing"),
            }
            StepOutput {
                signal: Some(EmbeddingSignal::NotFound),
                ..StepOutput::stopped(Some(SubmitState::Failed))
            }
        }
    }
}

async fn on_poll_tick(
    input: &StepInput<'_>,
    status: &dyn StatusSource,
    polling: &PollingConfig,
) -> StepOutput {
    let reported = match (input.job_id, input.submitted_at.as_ref()) {
        (Some(job_id), Some(submitted_at)) => {
            match status.job_status(job_id, submitted_at).await {
                Ok(s) => s,
                Err(e) => {
                    warn!("Status query for job {} failed: {}", job_id, e);
                    None
                }
            }
        }
        _ => None,
    };
    debug!("Polled job: {:?}", reported);

    match reported {
        None => StepOutput {
            interval_ms: Some(polling.waiting_ms),
            reset_ticks: true,
            state: Some(SubmitState::Submitted),
            ..StepOutput::default()
        },
        Some(s) => {
            let state = SubmitState::from(s);
            if state != input.state {
                info!("Job state {} -> {}", input.state, state);
            }
            StepOutput {
                interval_ms: Some(polling.status_ms),
                reset_ticks: true,
                state: Some(state),
                ..StepOutput::default()
            }
        }
    }
}
