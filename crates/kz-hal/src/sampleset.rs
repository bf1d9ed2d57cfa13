//! Sample sets returned by samplers.

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Ordered collection of spin assignments.
///
/// Each row of `record` is one read; each column belongs to the variable at
/// the same position in `variables`. Spins are stored as `-1` / `+1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    variables: Vec<u32>,
    record: Array2<i8>,
    energies: Vec<f64>,
}

impl SampleSet {
    /// Create a sample set, checking that shapes agree.
    pub fn new(variables: Vec<u32>, record: Array2<i8>, energies: Vec<f64>) -> HalResult<Self> {
        if record.ncols() != variables.len() {
            return Err(HalError::InvalidSampleSet(format!(
                "{} columns but {} variables",
                record.ncols(),
                variables.len()
            )));
        }
        if !energies.is_empty() && energies.len() != record.nrows() {
            return Err(HalError::InvalidSampleSet(format!(
                "{} rows but {} energies",
                record.nrows(),
                energies.len()
            )));
        }
        if record.iter().any(|&s| s != 1 && s != -1) {
            return Err(HalError::InvalidSampleSet(
                "spin values must be -1 or +1".into(),
            ));
        }
        Ok(Self {
            variables,
            record,
            energies,
        })
    }

    /// Build a sample set from row vectors over variables `0..n`.
    pub fn from_rows(rows: &[Vec<i8>]) -> HalResult<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != ncols) {
            return Err(HalError::InvalidSampleSet("ragged rows".into()));
        }
        let flat: Vec<i8> = rows.iter().flatten().copied().collect();
        let record = Array2::from_shape_vec((rows.len(), ncols), flat)
            .map_err(|e| HalError::InvalidSampleSet(e.to_string()))?;
        let variables = (0..ncols as u32).collect();
        Self::new(variables, record, vec![])
    }

    /// Variable labels, one per column.
    pub fn variables(&self) -> &[u32] {
        &self.variables
    }

    /// Raw spin matrix.
    pub fn record(&self) -> &Array2<i8> {
        &self.record
    }

    /// Energies per read (may be empty if the sampler does not report them).
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Number of reads.
    pub fn num_samples(&self) -> usize {
        self.record.nrows()
    }

    /// Number of variables per read.
    pub fn num_variables(&self) -> usize {
        self.record.ncols()
    }

    /// True if there are no reads.
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// One read as a view.
    pub fn sample(&self, index: usize) -> Option<ArrayView1<'_, i8>> {
        (index < self.num_samples()).then(|| self.record.row(index))
    }

    /// Iterate over reads.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, i8>> {
        self.record.rows().into_iter()
    }

    /// Column position of a variable.
    pub fn column_of(&self, variable: u32) -> Option<usize> {
        self.variables.iter().position(|&v| v == variable)
    }

    /// Select columns for `variables` (in that order), relabelling them
    /// `0..variables.len()`.
    pub fn select(&self, variables: &[u32]) -> HalResult<SampleSet> {
        let columns = variables
            .iter()
            .map(|&v| {
                self.column_of(v).ok_or_else(|| {
                    HalError::InvalidSampleSet(format!("variable {v} missing from sample set"))
                })
            })
            .collect::<HalResult<Vec<_>>>()?;
        let record = self.record.select(Axis(1), &columns);
        Ok(SampleSet {
            variables: (0..variables.len() as u32).collect(),
            record,
            energies: self.energies.clone(),
        })
    }
}
