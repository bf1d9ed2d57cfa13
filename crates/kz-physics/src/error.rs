//! Error types for the physics crate.

use thiserror::Error;

/// Errors produced by model construction, kink statistics and curve fitting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PhysicsError {
    /// A ring needs at least three spins to be a simple cycle.
    #[error("ring must have at least 3 spins, got {0}")]
    InvalidRing(usize),

    /// Sample set has no reads or no variables.
    #[error("sample set is empty")]
    EmptySampleSet,

    /// Sample rows have different lengths.
    #[error("ragged sample set: row {row} has {got} spins, expected {expected}")]
    RaggedSampleSet {
        /// Offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        got: usize,
    },

    /// Anneal times must be positive and finite.
    #[error("invalid anneal time {0} ns")]
    InvalidAnnealTime(f64),

    /// Schedule table is malformed.
    #[error("invalid anneal schedule: {0}")]
    InvalidSchedule(String),

    /// The critical point exists but the rate constant is undefined there.
    #[error("degenerate schedule at s = {s}: {reason}")]
    DegenerateSchedule {
        /// Anneal fraction of the critical point.
        s: f64,
        /// What made the computation undefined.
        reason: String,
    },

    /// A(s) never crosses B(s)·|J| on the schedule grid.
    #[error("no critical point for |J| = {0} on this schedule")]
    NoCriticalPoint(f64),

    /// Too few observations for a fit.
    #[error("need at least {needed} observations to fit, got {got}")]
    InsufficientData {
        /// Minimum number of observations.
        needed: usize,
        /// Observations supplied.
        got: usize,
    },

    /// The regression is rank deficient (x² values coincide).
    #[error("ill-conditioned fit: {0}")]
    IllConditioned(String),

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Reading a schedule file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
