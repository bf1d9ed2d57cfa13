//! One-to-one embeddings of spin rings onto device graphs.
//!
//! An [`Embedding`] maps each logical spin to a chain of physical qubits.
//! Only chains of length one are produced here: a ring of N spins is
//! embedded by finding a simple N-cycle in the device's coupling graph.
//!
//! The [`EmbeddingCache`] holds one embedding per ring size for the
//! currently selected sampler and is revalidated whenever the device graph
//! may have changed.

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use kz_hal::{IsingProblem, SampleSet};
use kz_physics::ring::ring_edges;
use petgraph::graphmap::UnGraphMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{SchedError, SchedResult};

/// Search nodes expanded between two deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Mapping from logical spin to a chain of physical qubits.
///
/// Serialized as `{"<spin>": [<qubit>, ...]}`; the string keys of the
/// persisted format are read back as integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    chains: BTreeMap<u32, Vec<u32>>,
}

impl Embedding {
    /// Create an empty embedding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a one-to-one embedding from `(spin, qubit)` pairs.
    pub fn from_one_to_one(pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self {
            chains: pairs.into_iter().map(|(s, q)| (s, vec![q])).collect(),
        }
    }

    /// Map spin `i` of a ring onto the i-th qubit of a device cycle.
    pub fn from_cycle(cycle: &[u32]) -> Self {
        Self::from_one_to_one(cycle.iter().enumerate().map(|(i, &q)| (i as u32, q)))
    }

    /// Set the chain of a spin.
    pub fn insert_chain(&mut self, spin: u32, chain: Vec<u32>) {
        self.chains.insert(spin, chain);
    }

    /// Chain of a spin.
    pub fn chain(&self, spin: u32) -> Option<&[u32]> {
        self.chains.get(&spin).map(Vec::as_slice)
    }

    /// The single qubit of a spin, if its chain has length one.
    pub fn qubit(&self, spin: u32) -> Option<u32> {
        match self.chain(spin) {
            Some([q]) => Some(*q),
            _ => None,
        }
    }

    /// Iterate over `(spin, chain)` pairs in spin order.
    pub fn chains(&self) -> impl Iterator<Item = (u32, &[u32])> {
        self.chains.iter().map(|(s, c)| (*s, c.as_slice()))
    }

    /// Number of embedded spins.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// True if no spin is embedded.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// True if every chain has exactly one qubit and no qubit is reused.
    pub fn is_one_to_one(&self) -> bool {
        let mut seen = FxHashSet::default();
        self.chains
            .values()
            .all(|c| c.len() == 1 && seen.insert(c[0]))
    }

    /// Check that this embedding maps an N-spin ring onto `device_edges`:
    /// spins `0..N` each own a single distinct qubit and every ring edge
    /// lands on a device edge. `device_edges` holds `(min, max)` pairs.
    pub fn is_valid_for_ring(&self, ring_size: usize, device_edges: &FxHashSet<(u32, u32)>) -> bool {
        if self.len() != ring_size || !self.is_one_to_one() {
            return false;
        }
        ring_edges(ring_size).into_iter().all(|(u, v)| {
            match (self.qubit(u), self.qubit(v)) {
                (Some(a), Some(b)) => device_edges.contains(&(a.min(b), a.max(b))),
                _ => false,
            }
        })
    }

    /// Relabel a logical problem onto physical qubits.
    pub fn embed(&self, problem: &IsingProblem) -> SchedResult<IsingProblem> {
        let physical = |v: u32| {
            self.qubit(v).ok_or_else(|| {
                SchedError::InvalidEmbedding(format!("spin {v} has no one-to-one chain"))
            })
        };
        let mut embedded = IsingProblem::new();
        for &(v, h) in &problem.linear {
            embedded.add_linear(physical(v)?, h);
        }
        for c in &problem.quadratic {
            embedded.add_quadratic(physical(c.u)?, physical(c.v)?, c.bias);
        }
        Ok(embedded)
    }

    /// Pick the physical columns of `samples` back into logical order
    /// `0..len()`.
    pub fn unembed(&self, samples: &SampleSet) -> SchedResult<SampleSet> {
        let qubits = (0..self.len() as u32)
            .map(|s| {
                self.qubit(s).ok_or_else(|| {
                    SchedError::InvalidEmbedding(format!("spin {s} has no one-to-one chain"))
                })
            })
            .collect::<SchedResult<Vec<_>>>()?;
        samples
            .select(&qubits)
            .map_err(|e| SchedError::InvalidEmbedding(e.to_string()))
    }
}

/// Embeddings of the selected sampler, keyed by ring size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingCache {
    entries: BTreeMap<usize, Embedding>,
}

impl EmbeddingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Embedding for a ring size.
    pub fn get(&self, ring_size: usize) -> Option<&Embedding> {
        self.entries.get(&ring_size)
    }

    /// True if an embedding for `ring_size` is cached.
    pub fn contains(&self, ring_size: usize) -> bool {
        self.entries.contains_key(&ring_size)
    }

    /// Cached ring sizes, ascending.
    pub fn ring_sizes(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    /// Number of cached embeddings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove entries that no longer embed their ring into `device_edges`.
    /// Returns the evicted ring sizes.
    pub fn validate_and_prune(&mut self, device_edges: &FxHashSet<(u32, u32)>) -> Vec<usize> {
        let stale: Vec<usize> = self
            .entries
            .iter()
            .filter(|(n, emb)| !emb.is_valid_for_ring(**n, device_edges))
            .map(|(n, _)| *n)
            .collect();
        for n in &stale {
            self.entries.remove(n);
        }
        if !stale.is_empty() {
            info!("Evicted {} stale embeddings: {:?}", stale.len(), stale);
        }
        stale
    }

    /// Insert a newly found embedding, replacing any previous one.
    pub fn merge_discovered(&mut self, ring_size: usize, embedding: Embedding) {
        debug!("Caching embedding for {} spins", ring_size);
        self.entries.insert(ring_size, embedding);
    }
}

/// Search the device graph for a simple cycle of `ring_size` qubits and
/// return it as a one-to-one embedding.
///
/// The search stops at `timeout`; an exhausted search fails with
/// [`SchedError::EmbeddingNotFound`].
#[instrument(skip(device_edges), fields(edges = device_edges.len()))]
pub fn find_one_to_one_embedding(
    ring_size: usize,
    device_edges: &[(u32, u32)],
    timeout: Duration,
) -> SchedResult<Embedding> {
    if ring_size < 3 {
        return Err(SchedError::InvalidRingSize(ring_size));
    }
    let graph: UnGraphMap<u32, ()> =
        UnGraphMap::from_edges(device_edges.iter().copied().filter(|(u, v)| u != v));
    if graph.node_count() < ring_size {
        return Err(SchedError::EmbeddingNotFound(ring_size));
    }

    let deadline = Instant::now() + timeout;
    let mut nodes: Vec<u32> = graph.nodes().collect();
    nodes.sort_unstable();

    for start in nodes {
        let search = CycleSearch::new(&graph, start, ring_size, deadline);
        match search.run() {
            Ok(Some(cycle)) => {
                info!("Found {}-cycle starting at qubit {}", ring_size, start);
                return Ok(Embedding::from_cycle(&cycle));
            }
            Ok(None) => continue,
            Err(Expired) => {
                return Err(SchedError::EmbeddingTimeout {
                    ring_size,
                    secs: timeout.as_secs_f64(),
                });
            }
        }
    }
    Err(SchedError::EmbeddingNotFound(ring_size))
}

/// Deadline reached.
struct Expired;

/// Depth-first search for an N-cycle whose smallest qubit is `start`.
struct CycleSearch<'g> {
    graph: &'g UnGraphMap<u32, ()>,
    start: u32,
    ring_size: usize,
    deadline: Instant,
    /// Hop distance back to `start` through qubits `>= start`.
    distance: FxHashMap<u32, usize>,
    on_path: FxHashSet<u32>,
    expanded: u64,
}

impl<'g> CycleSearch<'g> {
    fn new(graph: &'g UnGraphMap<u32, ()>, start: u32, ring_size: usize, deadline: Instant) -> Self {
        let mut distance = FxHashMap::default();
        let mut queue = VecDeque::from([start]);
        distance.insert(start, 0);
        while let Some(v) = queue.pop_front() {
            let d = distance[&v];
            for w in graph.neighbors(v) {
                if w > start && !distance.contains_key(&w) {
                    distance.insert(w, d + 1);
                    queue.push_back(w);
                }
            }
        }
        Self {
            graph,
            start,
            ring_size,
            deadline,
            distance,
            on_path: FxHashSet::default(),
            expanded: 0,
        }
    }

    /// Extensions of a path of `len` qubits ending at `v`, best last.
    fn candidates(&self, v: u32, len: usize) -> Vec<u32> {
        // After the step the path holds len + 1 qubits and needs
        // ring_size - len more edges to close.
        let budget = self.ring_size - len;
        let mut next: Vec<(usize, u32)> = self
            .graph
            .neighbors(v)
            .filter(|w| *w > self.start && !self.on_path.contains(w))
            .filter(|w| self.distance.get(w).is_some_and(|d| *d <= budget))
            .map(|w| (self.free_degree(w), w))
            .collect();
        // Fewest onward options first (popped from the back).
        next.sort_unstable_by(|a, b| b.cmp(a));
        next.into_iter().map(|(_, w)| w).collect()
    }

    fn free_degree(&self, v: u32) -> usize {
        self.graph
            .neighbors(v)
            .filter(|w| *w >= self.start && !self.on_path.contains(w))
            .count()
    }

    fn run(mut self) -> Result<Option<Vec<u32>>, Expired> {
        if self.distance.len() < self.ring_size {
            return Ok(None);
        }
        let mut path = vec![self.start];
        self.on_path.insert(self.start);
        let mut frames = vec![self.candidates(self.start, 1)];

        while let Some(frame) = frames.last_mut() {
            self.expanded += 1;
            if self.expanded % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
                return Err(Expired);
            }
            match frame.pop() {
                None => {
                    frames.pop();
                    if let Some(v) = path.pop() {
                        self.on_path.remove(&v);
                    }
                }
                Some(next) if path.len() + 1 == self.ring_size => {
                    if self.graph.contains_edge(next, self.start) {
                        path.push(next);
                        return Ok(Some(path));
                    }
                }
                Some(next) => {
                    path.push(next);
                    self.on_path.insert(next);
                    let len = path.len();
                    frames.push(self.candidates(next, len));
                }
            }
        }
        Ok(None)
    }
}

/// Strategy for finding a one-to-one ring embedding.
#[async_trait]
pub trait EmbeddingFinder: Send + Sync {
    /// Find an embedding of a `ring_size` ring into `device_edges`. An empty
    /// embedding counts as not found.
    async fn find(&self, ring_size: usize, device_edges: &[(u32, u32)]) -> SchedResult<Embedding>;
}

/// Cycle search on the blocking thread pool, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct CycleSearchFinder {
    timeout: Duration,
}

impl CycleSearchFinder {
    /// Create a finder with the given search timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Search timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl EmbeddingFinder for CycleSearchFinder {
    async fn find(&self, ring_size: usize, device_edges: &[(u32, u32)]) -> SchedResult<Embedding> {
        let edges = device_edges.to_vec();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || find_one_to_one_embedding(ring_size, &edges, timeout))
            .await
            .map_err(|e| SchedError::Internal(format!("embedding search task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kz_hal::Topology;

    fn normalized(edges: &[(u32, u32)]) -> FxHashSet<(u32, u32)> {
        Topology::custom(edges.to_vec()).edge_set()
    }

    #[test]
    fn test_triangle_embedding() {
        let edges = [(10, 11), (11, 12), (12, 10)];
        let emb = find_one_to_one_embedding(3, &edges, Duration::from_secs(1)).unwrap();
        assert_eq!(emb, Embedding::from_one_to_one([(0, 10), (1, 11), (2, 12)]));
        assert!(emb.is_valid_for_ring(3, &normalized(&edges)));
    }

    #[test]
    fn test_no_cycle_in_path_graph() {
        let edges = [(0, 1), (1, 2), (2, 3)];
        assert!(matches!(
            find_one_to_one_embedding(3, &edges, Duration::from_secs(1)),
            Err(SchedError::EmbeddingNotFound(3))
        ));
    }

    #[test]
    fn test_short_ring_rejected() {
        assert!(matches!(
            find_one_to_one_embedding(2, &[(0, 1)], Duration::from_secs(1)),
            Err(SchedError::InvalidRingSize(2))
        ));
    }

    #[test]
    fn test_torus_cycles() {
        let topology = Topology::torus(8, 8);
        let edges = topology.edge_set();
        for n in [4, 8, 16, 32] {
            let emb = find_one_to_one_embedding(n, &topology.edges, Duration::from_secs(10)).unwrap();
            assert!(emb.is_valid_for_ring(n, &edges), "invalid {n}-cycle");
        }
    }

    #[test]
    fn test_embed_and_unembed() {
        let emb = Embedding::from_one_to_one([(0, 7), (1, 3), (2, 5)]);
        let mut problem = IsingProblem::new();
        problem.add_quadratic(0, 1, -1.0);
        problem.add_quadratic(1, 2, -1.0);
        problem.add_quadratic(2, 0, -1.0);
        let embedded = emb.embed(&problem).unwrap();
        assert_eq!(embedded.variables(), vec![3, 5, 7]);

        let physical = SampleSet::new(
            vec![3, 5, 7],
            ndarray::array![[1i8, -1, 1], [-1, -1, 1]],
            vec![],
        )
        .unwrap();
        let logical = emb.unembed(&physical).unwrap();
        // spin 0 <- qubit 7, spin 1 <- qubit 3, spin 2 <- qubit 5
        assert_eq!(logical.record(), &ndarray::array![[1i8, 1, -1], [1, -1, -1]]);
    }

    #[test]
    fn test_unembed_missing_qubit() {
        let emb = Embedding::from_one_to_one([(0, 1), (1, 2), (2, 9)]);
        let samples = SampleSet::from_rows(&[vec![1, 1, 1]]).unwrap();
        assert!(matches!(emb.unembed(&samples), Err(SchedError::InvalidEmbedding(_))));
    }

    #[test]
    fn test_validate_and_prune() {
        let mut cache = EmbeddingCache::new();
        cache.merge_discovered(3, Embedding::from_one_to_one([(0, 0), (1, 1), (2, 2)]));
        cache.merge_discovered(4, Embedding::from_one_to_one([(0, 0), (1, 1), (2, 2), (3, 3)]));

        // (2, 3) and (3, 0) are gone from the device.
        let device = normalized(&[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(cache.validate_and_prune(&device), vec![4]);
        assert_eq!(cache.ring_sizes(), vec![3]);
        assert!(cache.validate_and_prune(&device).is_empty());
    }

    #[test]
    fn test_chains_longer_than_one_are_invalid() {
        let mut emb = Embedding::from_one_to_one([(0, 0), (1, 1)]);
        emb.insert_chain(2, vec![2, 3]);
        assert!(!emb.is_one_to_one());
        assert!(!emb.is_valid_for_ring(3, &normalized(&[(0, 1), (1, 2), (2, 0), (3, 0)])));
    }

    #[test]
    fn test_json_format_uses_string_keys() {
        let mut cache = EmbeddingCache::new();
        cache.merge_discovered(3, Embedding::from_one_to_one([(0, 10), (1, 11), (2, 12)]));
        let json = serde_json::to_string(&cache).unwrap();
        assert_eq!(json, r#"{"3":{"0":[10],"1":[11],"2":[12]}}"#);
        let back: EmbeddingCache = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cache);
    }

    #[tokio::test]
    async fn test_finder_runs_search() {
        let finder = CycleSearchFinder::new(Duration::from_secs(1));
        let emb = finder.find(3, &[(1, 2), (2, 3), (3, 1)]).await.unwrap();
        assert_eq!(emb.len(), 3);
        assert!(finder.find(5, &[(1, 2)]).await.is_err());
    }
}
