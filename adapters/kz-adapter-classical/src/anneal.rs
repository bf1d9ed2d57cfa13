//! Annealed single-spin dynamics on an Ising problem.

use kz_hal::{HalError, HalResult, IsingProblem, SampleSet};
use ndarray::Array2;
use rand::Rng;
use rustc_hash::FxHashMap;

/// Number of sweeps for an anneal time: `max(1, round(ns × sweeps_per_ns))`.
pub fn sweeps_for(anneal_time_us: f64, sweeps_per_ns: f64) -> usize {
    let sweeps = (anneal_time_us * 1000.0 * sweeps_per_ns).round();
    if sweeps.is_finite() && sweeps >= 1.0 {
        sweeps as usize
    } else {
        1
    }
}

/// Glauber (heat-bath) acceptance: `1 / (1 + exp(β ΔE))`.
///
/// Moves that leave the energy unchanged are accepted half of the time, so
/// domain walls on a ring random-walk and annihilate.
pub fn flip_probability(beta: f64, delta: f64) -> f64 {
    1.0 / (1.0 + (beta * delta).exp())
}

/// Problem compiled into index-based adjacency lists.
pub struct GlauberAnneal {
    variables: Vec<u32>,
    linear: Vec<f64>,
    neighbours: Vec<Vec<(usize, f64)>>,
    beta: f64,
}

impl GlauberAnneal {
    /// Compile `problem` for annealing up to inverse temperature `beta`.
    pub fn new(problem: &IsingProblem, beta: f64) -> HalResult<Self> {
        let variables = problem.variables();
        if variables.is_empty() {
            return Err(HalError::InvalidProblem("problem has no variables".into()));
        }
        if !beta.is_finite() || beta < 0.0 {
            return Err(HalError::Configuration(format!("invalid inverse temperature {beta}")));
        }
        let index: FxHashMap<u32, usize> =
            variables.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let mut linear = vec![0.0; variables.len()];
        for &(v, h) in &problem.linear {
            linear[index[&v]] += h;
        }
        let mut neighbours = vec![Vec::new(); variables.len()];
        for c in &problem.quadratic {
            let (u, v) = (index[&c.u], index[&c.v]);
            neighbours[u].push((v, c.bias));
            neighbours[v].push((u, c.bias));
        }

        Ok(Self {
            variables,
            linear,
            neighbours,
            beta,
        })
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Local field h_i + Σ J_ij s_j.
    fn field(&self, spins: &[i8], i: usize) -> f64 {
        self.linear[i]
            + self.neighbours[i]
                .iter()
                .map(|&(j, bias)| bias * f64::from(spins[j]))
                .sum::<f64>()
    }

    /// One read: random start, then `sweeps` sweeps of heat-bath updates
    /// at random sites while β ramps linearly up to its final value.
    fn read<R: Rng>(&self, rng: &mut R, sweeps: usize) -> Vec<i8> {
        let n = self.variables.len();
        let mut spins: Vec<i8> = (0..n).map(|_| if rng.r#gen::<bool>() { 1 } else { -1 }).collect();
        for sweep in 0..sweeps {
            let beta = self.beta_at(sweep, sweeps);
            for _ in 0..n {
                let i = rng.gen_range(0..n);
                let delta = -2.0 * f64::from(spins[i]) * self.field(&spins, i);
                if rng.r#gen::<f64>() < flip_probability(beta, delta) {
                    spins[i] = -spins[i];
                }
            }
        }
        spins
    }

    /// Inverse temperature during sweep `sweep` of `sweeps`.
    fn beta_at(&self, sweep: usize, sweeps: usize) -> f64 {
        self.beta * (sweep + 1) as f64 / sweeps.max(1) as f64
    }

    /// Draw `num_reads` reads.
    pub fn sample<R: Rng>(
        &self,
        problem: &IsingProblem,
        rng: &mut R,
        num_reads: u32,
        sweeps: usize,
    ) -> HalResult<SampleSet> {
        let n = self.variables.len();
        let mut flat = Vec::with_capacity(num_reads as usize * n);
        let mut energies = Vec::with_capacity(num_reads as usize);
        for _ in 0..num_reads {
            let spins = self.read(rng, sweeps);
            let by_var: FxHashMap<u32, i8> =
                self.variables.iter().copied().zip(spins.iter().copied()).collect();
            energies.push(problem.energy(|v| by_var.get(&v).copied()));
            flat.extend_from_slice(&spins);
        }
        let record = Array2::from_shape_vec((num_reads as usize, n), flat)
            .map_err(|e| HalError::InvalidSampleSet(e.to_string()))?;
        SampleSet::new(self.variables.clone(), record, energies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ring(n: u32, j: f64) -> IsingProblem {
        let mut problem = IsingProblem::new();
        for i in 0..n {
            problem.add_quadratic(i, (i + 1) % n, j);
        }
        problem
    }

    #[test]
    fn test_sweeps_for() {
        assert_eq!(sweeps_for(0.007, 1.0), 7);
        assert_eq!(sweeps_for(0.0001, 1.0), 1);
        assert_eq!(sweeps_for(0.35, 2.0), 700);
        assert_eq!(sweeps_for(f64::NAN, 1.0), 1);
    }

    #[test]
    fn test_flip_probability() {
        assert_eq!(flip_probability(3.0, 0.0), 0.5);
        assert!(flip_probability(3.0, -5.6) > 0.99);
        assert!(flip_probability(3.0, 5.6) < 1e-7);
        assert_eq!(flip_probability(1e6, 1e6), 0.0);
    }

    #[test]
    fn test_beta_ramps_to_final_value() {
        let anneal = GlauberAnneal::new(&ring(4, -1.0), 3.0).unwrap();
        assert_eq!(anneal.beta_at(0, 3), 1.0);
        assert_eq!(anneal.beta_at(2, 3), 3.0);
        assert_eq!(anneal.beta_at(0, 1), 3.0);
    }

    #[test]
    fn test_empty_problem_rejected() {
        assert!(matches!(
            GlauberAnneal::new(&IsingProblem::new(), 1.0),
            Err(HalError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_sample_shape_and_energies() {
        let problem = ring(10, -1.0);
        let anneal = GlauberAnneal::new(&problem, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let set = anneal.sample(&problem, &mut rng, 5, 3).unwrap();
        assert_eq!(set.num_samples(), 5);
        assert_eq!(set.num_variables(), 10);
        for (row, &e) in set.rows().zip(set.energies()) {
            let expected = problem.energy(|v| Some(row[v as usize]));
            assert!((e - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cold_long_anneal_orders_ring() {
        let problem = ring(16, -1.0);
        let anneal = GlauberAnneal::new(&problem, 50.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let set = anneal.sample(&problem, &mut rng, 4, 2000).unwrap();
        // Ground state energy is -16; kinks come in pairs costing 4.
        for &e in set.energies() {
            assert!(e <= -16.0 + 4.0 * 2.0 + 1e-9);
        }
    }
}
