//! Kink-density statistics.
//!
//! A kink is a defect in the ordered ground state of the ring: a sign
//! switch between neighbours for ferromagnetic coupling (J < 0), or a pair
//! of identical neighbours for antiferromagnetic coupling (J ≥ 0). The
//! ring is cyclic, so spin 0 is compared with spin N−1.

use std::f64::consts::PI;

use kz_hal::SampleSet;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};
use crate::schedule::AnnealSchedule;

/// Per-sample kink counts and their mean density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinkStats {
    /// Kinks in each read.
    pub per_sample: Vec<usize>,
    /// Mean kinks per spin, averaged over reads.
    pub mean_kink_density: f64,
}

impl KinkStats {
    /// Index of the read whose count is closest to the mean count; the
    /// first such read on ties.
    pub fn representative_index(&self) -> Option<usize> {
        if self.per_sample.is_empty() {
            return None;
        }
        let mean =
            self.per_sample.iter().sum::<usize>() as f64 / self.per_sample.len() as f64;
        let mut best = 0;
        for (i, &count) in self.per_sample.iter().enumerate() {
            if (count as f64 - mean).abs() < (self.per_sample[best] as f64 - mean).abs() {
                best = i;
            }
        }
        Some(best)
    }
}

/// Count kinks in one ring configuration.
fn count_kinks(spins: ArrayView1<'_, i8>, j: f64) -> usize {
    let n = spins.len();
    if n == 0 {
        return 0;
    }
    let mut previous = spins[n - 1];
    let mut kinks = 0;
    for &s in spins.iter() {
        let switched = s != previous;
        if (j < 0.0) == switched {
            kinks += 1;
        }
        previous = s;
    }
    kinks
}

fn finish(per_sample: Vec<usize>, ring_length: usize) -> KinkStats {
    let mean = per_sample.iter().sum::<usize>() as f64 / per_sample.len() as f64;
    KinkStats {
        per_sample,
        mean_kink_density: mean / ring_length as f64,
    }
}

/// Kink statistics of a sample set whose columns are the ring's spins in
/// ring order.
pub fn kink_stats(sample_set: &SampleSet, j: f64) -> PhysicsResult<KinkStats> {
    if sample_set.is_empty() || sample_set.num_variables() == 0 {
        return Err(PhysicsError::EmptySampleSet);
    }
    let per_sample = sample_set.rows().map(|row| count_kinks(row, j)).collect();
    Ok(finish(per_sample, sample_set.num_variables()))
}

/// Kink statistics of raw spin rows.
pub fn kink_stats_rows(rows: &[Vec<i8>], j: f64) -> PhysicsResult<KinkStats> {
    let expected = rows.first().map_or(0, Vec::len);
    if expected == 0 {
        return Err(PhysicsError::EmptySampleSet);
    }
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
        return Err(PhysicsError::RaggedSampleSet {
            row,
            expected,
            got: r.len(),
        });
    }
    let per_sample = rows
        .iter()
        .map(|r| count_kinks(ArrayView1::from(r.as_slice()), j))
        .collect();
    Ok(finish(per_sample, expected))
}

/// Kink density predicted by the Kibble-Zurek mechanism for each anneal
/// time (ns), n(t) = t^(−1/2) / (2π√(2b)) with t in seconds.
pub fn theoretical_kink_density(
    anneal_times_ns: &[f64],
    j: f64,
    schedule: &AnnealSchedule,
) -> PhysicsResult<Vec<f64>> {
    if let Some(&bad) = anneal_times_ns.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
        return Err(PhysicsError::InvalidAnnealTime(bad));
    }
    let b = schedule.kz_rate(j)?;
    let scale = 2.0 * PI * (2.0 * b).sqrt();
    Ok(anneal_times_ns
        .iter()
        .map(|&t| (1e-9 * t).powf(-0.5) / scale)
        .collect())
}

/// `count` anneal times spaced logarithmically over `[min_ns, max_ns]`.
pub fn log_spaced_times(min_ns: f64, max_ns: f64, count: usize) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![min_ns],
        _ => {
            let (lo, hi) = (min_ns.log10(), max_ns.log10());
            let step = (hi - lo) / (count - 1) as f64;
            (0..count)
                .map(|i| 10f64.powf(lo + step * i as f64))
                .collect()
        }
    }
}
