//! Data Transfer Objects for the dashboard API.
//!
//! These types bridge sampler and session structures to JSON responses.
//! Session views and parameter updates are served with the session's own
//! serializable types.

use kz_hal::Sampler;
use serde::{Deserialize, Serialize};

// ============================================================================
// Samplers
// ============================================================================

/// Summary of a registered sampler.
#[derive(Debug, Serialize)]
pub struct SamplerSummary {
    /// Sampler name.
    pub name: String,
    /// Whether this is the local classical fallback.
    pub classical: bool,
    /// Qubits in the device graph.
    pub num_qubits: usize,
    /// Couplers in the device graph.
    pub num_couplers: usize,
    /// Supported anneal times in microseconds.
    pub anneal_time_range_us: (f64, f64),
    /// Whether the session currently uses this sampler.
    pub selected: bool,
}

impl SamplerSummary {
    pub fn from_sampler(sampler: &dyn Sampler, selected: bool) -> Self {
        let properties = sampler.properties();
        Self {
            name: sampler.name().to_string(),
            classical: properties.is_classical,
            num_qubits: properties.topology.num_qubits(),
            num_couplers: properties.topology.edges.len(),
            anneal_time_range_us: properties.anneal_time_range_us,
            selected,
        }
    }
}

/// Request to switch samplers.
#[derive(Debug, Deserialize)]
pub struct SelectSamplerRequest {
    pub name: String,
}

// ============================================================================
// Spin states
// ============================================================================

/// Representative spin configuration of the last completed job.
#[derive(Debug, Serialize)]
pub struct SpinsResponse {
    /// Spins in ring order.
    pub spins: Vec<i8>,
    /// Bonds `i` (between spin `i` and `i + 1`, cyclic) holding a kink.
    pub kinks: Vec<usize>,
    /// Coupling strength the kinks refer to.
    pub coupling_strength: f64,
    /// Mean kink density of the job.
    pub kink_density: f64,
}

/// Positions of the kinks in a ring configuration.
///
/// For ferromagnetic coupling (J < 0) a kink is a sign switch, otherwise a
/// pair of equal neighbours.
pub fn kink_positions(spins: &[i8], coupling_strength: f64) -> Vec<usize> {
    let n = spins.len();
    (0..n)
        .filter(|&i| {
            let switched = spins[i] != spins[(i + 1) % n];
            (coupling_strength < 0.0) == switched
        })
        .collect()
}

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status (always "ok" if responding).
    pub status: String,
    /// Dashboard version.
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
