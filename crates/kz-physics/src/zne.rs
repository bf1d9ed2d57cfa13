//! Zero-noise extrapolation.
//!
//! At a fixed anneal time, each completed job contributes one observation
//! (λ, kink density). The density is modelled as y = a + b·λ², fitted by
//! least squares in the transformed variable u = λ². The intercept a is
//! the zero-noise estimate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PhysicsError, PhysicsResult};

/// Relative tolerance below which the spread of λ² counts as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Fitted curve y = intercept + slope·x².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    /// Value at x = 0.
    pub intercept: f64,
    /// Coefficient of x².
    pub slope: f64,
}

impl FittedCurve {
    /// Evaluate the curve at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.intercept + self.slope * x * x
    }

    /// Extrapolated value at zero noise.
    pub fn zero_noise_estimate(&self) -> f64 {
        self.intercept
    }
}

/// Fit y = a + b·x² to `(x, y)` points.
///
/// Fails with [`PhysicsError::InsufficientData`] for fewer than two points
/// and [`PhysicsError::IllConditioned`] when the x² values do not spread.
pub fn fit_extrapolation(points: &[(f64, f64)]) -> PhysicsResult<FittedCurve> {
    if points.len() < 2 {
        return Err(PhysicsError::InsufficientData {
            needed: 2,
            got: points.len(),
        });
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(PhysicsError::IllConditioned("non-finite observation".into()));
    }

    let n = points.len() as f64;
    let u_mean = points.iter().map(|(x, _)| x * x).sum::<f64>() / n;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut suu = 0.0;
    let mut suy = 0.0;
    let mut u_norm = 0.0;
    for &(x, y) in points {
        let du = x * x - u_mean;
        suu += du * du;
        suy += du * (y - y_mean);
        u_norm += (x * x) * (x * x);
    }
    if suu <= RANK_TOLERANCE * u_norm || suu == 0.0 {
        return Err(PhysicsError::IllConditioned(format!(
            "{} observations share the same noise level",
            points.len()
        )));
    }

    let slope = suy / suu;
    let intercept = y_mean - slope * u_mean;
    Ok(FittedCurve { intercept, slope })
}

/// One completed job in zero-noise mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouplingObservation {
    /// Anneal-time rescaling used for the job.
    pub lambda: f64,
    /// Measured mean kink density.
    pub kink_density: f64,
    /// Coupling strength J of the job.
    pub coupling_strength: f64,
}

/// Result of appending an observation and refitting its bucket.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefitOutcome {
    /// Curve fitted to the bucket, if the fit succeeded.
    pub curve: Option<FittedCurve>,
    /// Why the fit failed, if it did.
    pub failure: Option<String>,
    /// Raise the error dialog. True exactly when the fit failed.
    pub show_error_modal: bool,
}

/// Observations accumulated per anneal time (ns), in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationHistory {
    buckets: BTreeMap<u32, Vec<CouplingObservation>>,
}

impl ObservationHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation to its anneal-time bucket.
    pub fn record(&mut self, anneal_time_ns: u32, observation: CouplingObservation) {
        self.buckets
            .entry(anneal_time_ns)
            .or_default()
            .push(observation);
    }

    /// Observations at one anneal time.
    pub fn bucket(&self, anneal_time_ns: u32) -> &[CouplingObservation] {
        self.buckets
            .get(&anneal_time_ns)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All buckets, ordered by anneal time.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[CouplingObservation])> {
        self.buckets.iter().map(|(t, obs)| (*t, obs.as_slice()))
    }

    /// Total number of observations.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drop all observations.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Fit the bucket at `anneal_time_ns` on (λ, kink density).
    pub fn fit(&self, anneal_time_ns: u32) -> PhysicsResult<FittedCurve> {
        let points: Vec<(f64, f64)> = self
            .bucket(anneal_time_ns)
            .iter()
            .map(|o| (o.lambda, o.kink_density))
            .collect();
        fit_extrapolation(&points)
    }

    /// Append `observation` and refit its bucket. A bucket with a single
    /// observation yields no curve and no error. Earlier observations are
    /// kept whatever the fit outcome.
    pub fn accumulate_and_refit(
        &mut self,
        anneal_time_ns: u32,
        observation: CouplingObservation,
    ) -> RefitOutcome {
        self.record(anneal_time_ns, observation);
        if self.bucket(anneal_time_ns).len() < 2 {
            return RefitOutcome::default();
        }
        match self.fit(anneal_time_ns) {
            Ok(curve) => {
                debug!(
                    anneal_time_ns,
                    intercept = curve.intercept,
                    slope = curve.slope,
                    "Refitted zero-noise curve"
                );
                RefitOutcome {
                    curve: Some(curve),
                    failure: None,
                    show_error_modal: false,
                }
            }
            Err(e) => {
                warn!("Zero-noise fit failed at {} ns: {}", anneal_time_ns, e);
                RefitOutcome {
                    curve: None,
                    failure: Some(e.to_string()),
                    show_error_modal: true,
                }
            }
        }
    }
}
