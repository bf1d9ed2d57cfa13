//! Job lifecycle types.
//!
//! A sampler job moves through the remote states
//!
//! ```text
//!   submit() ──→ Pending ──→ InProgress ──→ Completed
//!                  │             │
//!                  │             ├──→ Failed
//!                  │             │
//!                  └─────────────┴──→ Cancelled
//! ```
//!
//! Jobs are identified by their [`JobId`] *and* by the time they were
//! submitted. The submission time is embedded in the job label so that a
//! status reported for a superseded job can be told apart from the current
//! one.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of every job label; the submission time follows it.
pub const LABEL_PREFIX: &str = "Examples - Kibble-Zurek Simulation, submitted: ";

/// Wall-clock time at which a job was submitted.
pub type SubmitTime = DateTime<Utc>;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a job as reported by a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is waiting in the sampler queue.
    Pending,
    /// Job is currently running.
    InProgress,
    /// Job completed successfully.
    Completed,
    /// Job was cancelled.
    Cancelled,
    /// Job failed.
    Failed,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed
        )
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "IN_PROGRESS" => Ok(JobStatus::InProgress),
            "COMPLETED" => Ok(JobStatus::Completed),
            "CANCELLED" => Ok(JobStatus::Cancelled),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

fn format_submit_time(time: &SubmitTime) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the job label that carries the submission time.
pub fn submission_label(time: &SubmitTime) -> String {
    format!("{LABEL_PREFIX}{}", format_submit_time(time))
}

/// Check whether a label was produced for a job submitted at `time`.
pub fn label_matches(label: &str, time: &SubmitTime) -> bool {
    label
        .split_once("submitted: ")
        .is_some_and(|(_, stamp)| stamp == format_submit_time(time))
}
