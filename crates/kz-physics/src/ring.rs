//! Spin-ring model builder.
//!
//! The ring couples spin i to spin (i + 1) mod N with the same strength J.
//! J < 0 is ferromagnetic (neighbours align), J > 0 antiferromagnetic
//! (neighbours alternate).

use kz_hal::{Coupling, IsingProblem};
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};

/// A cyclic chain of N spins with uniform coupling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinRingModel {
    num_spins: usize,
    coupling_strength: f64,
}

/// Build the spin-ring model for `num_spins` spins coupled with strength
/// `coupling_strength`.
pub fn build_ring(num_spins: usize, coupling_strength: f64) -> PhysicsResult<SpinRingModel> {
    if num_spins < 3 {
        return Err(PhysicsError::InvalidRing(num_spins));
    }
    Ok(SpinRingModel {
        num_spins,
        coupling_strength,
    })
}

impl SpinRingModel {
    /// Number of spins.
    pub fn num_spins(&self) -> usize {
        self.num_spins
    }

    /// Uniform coupling strength J.
    pub fn coupling_strength(&self) -> f64 {
        self.coupling_strength
    }

    /// True for J < 0.
    pub fn is_ferromagnetic(&self) -> bool {
        self.coupling_strength < 0.0
    }

    /// Ring edges `(i, (i + 1) mod N)`.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        ring_edges(self.num_spins)
    }

    /// Couplings, one per edge.
    pub fn couplings(&self) -> Vec<Coupling> {
        self.edges()
            .into_iter()
            .map(|(u, v)| Coupling::new(u, v, self.coupling_strength))
            .collect()
    }

    /// The model as an Ising problem over logical variables `0..N`.
    pub fn to_problem(&self) -> IsingProblem {
        IsingProblem {
            linear: (0..self.num_spins as u32).map(|v| (v, 0.0)).collect(),
            quadratic: self.couplings(),
        }
    }
}

/// Edge set of an N-spin ring. Topology does not depend on J.
pub fn ring_edges(num_spins: usize) -> Vec<(u32, u32)> {
    let n = num_spins as u32;
    (0..n).map(|i| (i, (i + 1) % n)).collect()
}
