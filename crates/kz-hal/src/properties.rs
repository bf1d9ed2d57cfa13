//! Sampler property introspection.
//!
//! [`SamplerProperties`] describe what a sampler offers: its coupling graph
//! (used for embedding search and validation) and the anneal-time range it
//! accepts. All edges in [`Topology`] are undirected: if `(a, b)` is present,
//! so is the interaction `b - a`.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Qubit connectivity of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Coupling edges (pairs of connected qubits). Undirected.
    pub edges: Vec<(u32, u32)>,
}

impl Topology {
    /// Create a topology from an edge list.
    pub fn custom(edges: Vec<(u32, u32)>) -> Self {
        Self { edges }
    }

    /// A cycle over `n` qubits.
    pub fn ring(n: u32) -> Self {
        let edges = (0..n).map(|i| (i, (i + 1) % n)).collect();
        Self { edges }
    }

    /// A periodic `rows x cols` lattice (each qubit has four neighbours).
    pub fn torus(rows: u32, cols: u32) -> Self {
        let mut edges = vec![];
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                edges.push((idx, r * cols + (c + 1) % cols));
                edges.push((idx, ((r + 1) % rows) * cols + c));
            }
        }
        Self { edges }
    }

    /// Number of distinct qubits touched by an edge.
    pub fn num_qubits(&self) -> usize {
        self.edges
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Normalised edge set with `(min, max)` pairs for membership tests.
    pub fn edge_set(&self) -> FxHashSet<(u32, u32)> {
        self.edges
            .iter()
            .map(|&(a, b)| if a <= b { (a, b) } else { (b, a) })
            .collect()
    }

    /// Check whether two qubits are coupled.
    pub fn contains_edge(&self, a: u32, b: u32) -> bool {
        self.edges
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

/// Static properties of a sampler, cached at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerProperties {
    /// Name of the sampler.
    pub name: String,
    /// Device coupling graph.
    pub topology: Topology,
    /// Supported anneal-time range in microseconds, `(min, max)`.
    pub anneal_time_range_us: (f64, f64),
    /// Maximum reads per job.
    pub max_num_reads: u32,
    /// Whether this is the local classical fallback (needs no embedding).
    pub is_classical: bool,
}

impl SamplerProperties {
    /// Properties for a classical sampler over the given topology.
    pub fn classical(name: impl Into<String>, topology: Topology) -> Self {
        Self {
            name: name.into(),
            topology,
            anneal_time_range_us: (0.001, 10.0),
            max_num_reads: 10_000,
            is_classical: true,
        }
    }

    /// Properties for a quantum annealer.
    pub fn quantum(
        name: impl Into<String>,
        topology: Topology,
        anneal_time_range_us: (f64, f64),
    ) -> Self {
        Self {
            name: name.into(),
            topology,
            anneal_time_range_us,
            max_num_reads: 1_000,
            is_classical: false,
        }
    }

    /// Check whether the sampler accepts an anneal time.
    pub fn covers_anneal_time(&self, anneal_time_us: f64) -> bool {
        let (min, max) = self.anneal_time_range_us;
        anneal_time_us >= min && anneal_time_us <= max
    }
}
