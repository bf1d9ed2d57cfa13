//! Anneal schedules.
//!
//! A schedule is the device's table of energy coefficients over the anneal
//! fraction: the transverse-field energy A(s) falls while the problem
//! energy B(s) rises. The quantum critical point of a ring with coupling J
//! sits where A(s) = |J|·B(s).
//!
//! Schedules are read from the CSV files published for each device, with
//! the columns `s`, `A(s) (GHz)`, `B(s) (GHz)` and `C (normalized)`.
//! Derivatives are taken with respect to the normalized control `C`.

use std::f64::consts::PI;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PhysicsError, PhysicsResult};

/// GHz to Hz.
const GHZ: f64 = 1e9;

/// Number of rows in the built-in fallback schedule.
const FALLBACK_POINTS: usize = 1001;

/// One row of a schedule table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePoint {
    /// Anneal fraction.
    #[serde(rename = "s")]
    pub s: f64,
    /// Transverse-field energy in GHz.
    #[serde(rename = "A(s) (GHz)")]
    pub a_ghz: f64,
    /// Problem energy in GHz.
    #[serde(rename = "B(s) (GHz)")]
    pub b_ghz: f64,
    /// Normalized control signal.
    #[serde(rename = "C (normalized)")]
    pub c: f64,
}

/// Ordered table of schedule points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealSchedule {
    points: Vec<SchedulePoint>,
}

/// Critical point located on a schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalPoint {
    /// Anneal fraction at the critical point.
    pub s: f64,
    /// A(s*) in GHz.
    pub a_ghz: f64,
    /// B(s*) in GHz.
    pub b_ghz: f64,
    /// dA/dC at s*.
    pub a_slope: f64,
    /// dB/dC at s*.
    pub b_slope: f64,
}

impl CriticalPoint {
    /// Kibble-Zurek rate constant b (Hz) at this point.
    ///
    /// b = π·A(s*) / (B'(s*)/B(s*) − A'(s*)/A(s*)), with A converted to Hz.
    pub fn rate(&self) -> PhysicsResult<f64> {
        let degenerate = |reason: &str| PhysicsError::DegenerateSchedule {
            s: self.s,
            reason: reason.to_string(),
        };
        if self.a_ghz == 0.0 {
            return Err(degenerate("A(s*) is zero"));
        }
        if self.b_ghz == 0.0 {
            return Err(degenerate("B(s*) is zero"));
        }
        let denominator = self.b_slope / self.b_ghz - self.a_slope / self.a_ghz;
        if denominator == 0.0 || !denominator.is_finite() {
            return Err(degenerate("derivative denominator is zero"));
        }
        let b = GHZ * PI * self.a_ghz / denominator;
        if !b.is_finite() || b <= 0.0 {
            return Err(degenerate("rate constant is not positive"));
        }
        Ok(b)
    }
}

impl AnnealSchedule {
    /// Build a schedule from rows, which must be ordered by `s` and finite.
    pub fn from_points(points: Vec<SchedulePoint>) -> PhysicsResult<Self> {
        if points.len() < 2 {
            return Err(PhysicsError::InvalidSchedule(format!(
                "need at least 2 rows, got {}",
                points.len()
            )));
        }
        for (i, p) in points.iter().enumerate() {
            if ![p.s, p.a_ghz, p.b_ghz, p.c].iter().all(|v| v.is_finite()) {
                return Err(PhysicsError::InvalidSchedule(format!(
                    "row {i} has a non-finite value"
                )));
            }
        }
        if points.windows(2).any(|w| w[1].s < w[0].s) {
            return Err(PhysicsError::InvalidSchedule(
                "rows are not ordered by s".into(),
            ));
        }
        Ok(Self { points })
    }

    /// Parse a schedule CSV.
    pub fn from_reader<R: Read>(reader: R) -> PhysicsResult<Self> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let points = csv
            .deserialize::<SchedulePoint>()
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_points(points)
    }

    /// Load a schedule CSV from disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> PhysicsResult<Self> {
        let path = path.as_ref();
        debug!("Loading anneal schedule from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Generic schedule used when no device table matches:
    /// A(s) = 6(1−s)² GHz, B(s) = 12s² GHz, C = s.
    pub fn fallback() -> Self {
        let last = (FALLBACK_POINTS - 1) as f64;
        let points = (0..FALLBACK_POINTS)
            .map(|i| {
                let s = i as f64 / last;
                SchedulePoint {
                    s,
                    a_ghz: 6.0 * (1.0 - s).powi(2),
                    b_ghz: 12.0 * s.powi(2),
                    c: s,
                }
            })
            .collect();
        Self { points }
    }

    /// Rows of the table.
    pub fn points(&self) -> &[SchedulePoint] {
        &self.points
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed schedule.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn gap(&self, i: usize, j_abs: f64) -> f64 {
        self.points[i].a_ghz - j_abs * self.points[i].b_ghz
    }

    /// Index of the first segment on which A − |J|·B changes sign.
    fn crossing_segment(&self, j_abs: f64) -> Option<usize> {
        (0..self.points.len() - 1).find(|&i| self.gap(i, j_abs) * self.gap(i + 1, j_abs) <= 0.0)
    }

    /// Row index minimizing |A(s) − |J|·B(s)|.
    ///
    /// Fails with [`PhysicsError::NoCriticalPoint`] when the two curves do
    /// not meet on the table, which includes J = 0.
    pub fn critical_index(&self, j: f64) -> PhysicsResult<usize> {
        let j_abs = j.abs();
        if !j_abs.is_finite() || self.crossing_segment(j_abs).is_none() {
            return Err(PhysicsError::NoCriticalPoint(j_abs));
        }
        let mut best = 0;
        for i in 1..self.points.len() {
            if self.gap(i, j_abs).abs() < self.gap(best, j_abs).abs() {
                best = i;
            }
        }
        Ok(best)
    }

    /// Backward difference dA/dC, dB/dC at row `i` (undefined for row 0).
    fn backward_slopes(&self, i: usize) -> Option<(f64, f64)> {
        if i == 0 {
            return None;
        }
        let (p, q) = (&self.points[i - 1], &self.points[i]);
        let dc = q.c - p.c;
        if dc == 0.0 {
            return None;
        }
        Some(((q.a_ghz - p.a_ghz) / dc, (q.b_ghz - p.b_ghz) / dc))
    }

    /// Critical point at the nearest table row, with backward-difference
    /// derivatives.
    pub fn critical_point(&self, j: f64) -> PhysicsResult<CriticalPoint> {
        let i = self.critical_index(j)?;
        let p = self.points[i];
        let (a_slope, b_slope) =
            self.backward_slopes(i)
                .ok_or_else(|| PhysicsError::DegenerateSchedule {
                    s: p.s,
                    reason: "no derivative at this row".into(),
                })?;
        Ok(CriticalPoint {
            s: p.s,
            a_ghz: p.a_ghz,
            b_ghz: p.b_ghz,
            a_slope,
            b_slope,
        })
    }

    /// Kibble-Zurek rate constant b (Hz) on the table grid.
    pub fn kz_rate(&self, j: f64) -> PhysicsResult<f64> {
        self.critical_point(j)?.rate()
    }

    /// Nodal derivative dA/dC, dB/dC: central differences inside the
    /// table, one-sided at the ends.
    fn nodal_slopes(&self, i: usize) -> PhysicsResult<(f64, f64)> {
        let lo = i.saturating_sub(1);
        let hi = (i + 1).min(self.points.len() - 1);
        let (p, q) = (&self.points[lo], &self.points[hi]);
        let dc = q.c - p.c;
        if dc == 0.0 {
            return Err(PhysicsError::DegenerateSchedule {
                s: self.points[i].s,
                reason: "control signal is flat".into(),
            });
        }
        Ok(((q.a_ghz - p.a_ghz) / dc, (q.b_ghz - p.b_ghz) / dc))
    }

    /// Critical point interpolated between table rows. Varies continuously
    /// with J, unlike [`Self::critical_point`].
    pub fn interpolated_critical_point(&self, j: f64) -> PhysicsResult<CriticalPoint> {
        let j_abs = j.abs();
        if !j_abs.is_finite() {
            return Err(PhysicsError::NoCriticalPoint(j_abs));
        }
        let i = self
            .crossing_segment(j_abs)
            .ok_or(PhysicsError::NoCriticalPoint(j_abs))?;
        let (g0, g1) = (self.gap(i, j_abs), self.gap(i + 1, j_abs));
        let t = if g0 == g1 { 0.0 } else { g0 / (g0 - g1) };
        let lerp = |x: f64, y: f64| x + t * (y - x);

        let (p, q) = (&self.points[i], &self.points[i + 1]);
        let (a0, b0) = self.nodal_slopes(i)?;
        let (a1, b1) = self.nodal_slopes(i + 1)?;
        Ok(CriticalPoint {
            s: lerp(p.s, q.s),
            a_ghz: lerp(p.a_ghz, q.a_ghz),
            b_ghz: lerp(p.b_ghz, q.b_ghz),
            a_slope: lerp(a0, a1),
            b_slope: lerp(b0, b1),
        })
    }

    /// Rate constant at the interpolated critical point.
    pub fn kz_rate_continuous(&self, j: f64) -> PhysicsResult<f64> {
        self.interpolated_critical_point(j)?.rate()
    }
}

impl Default for AnnealSchedule {
    fn default() -> Self {
        Self::fallback()
    }
}
