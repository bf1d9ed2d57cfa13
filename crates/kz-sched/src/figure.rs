//! Plot series for the dashboard.
//!
//! Figures are plain numeric series; rendering is up to the client.

use std::collections::BTreeMap;

use kz_physics::{AnnealSchedule, ObservationHistory, log_spaced_times, theoretical_kink_density};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Points on a fitted curve.
const FIT_POINTS: usize = 50;

/// Experiment the session runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Kink density against anneal time.
    #[default]
    KibbleZurek,
    /// Zero-noise extrapolation over coupling strength.
    ZeroNoise,
}

/// What the main graph shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphDisplay {
    /// Kink density against anneal time.
    #[default]
    KinkDensity,
    /// A(s) and B(s) of the anneal schedule.
    Schedule,
    /// Kink density against λ with the extrapolation fits.
    Coupling,
}

/// One named series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Series {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True if the series has no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Measured kink density of one completed Kibble-Zurek job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KzPoint {
    pub anneal_time_ns: f64,
    pub kink_density: f64,
    pub coupling_strength: f64,
}

/// A figure ready for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// What the figure shows.
    pub display: GraphDisplay,
    /// Axis titles `(x, y)`.
    pub axes: (String, String),
    /// Plotted series.
    pub series: Vec<Series>,
    /// Shown instead of a curve that could not be computed.
    pub warning: Option<String>,
}

/// Everything a figure is built from.
#[derive(Debug, Clone, Copy)]
pub struct FigureInput<'a> {
    pub display: GraphDisplay,
    pub kind: ProblemKind,
    pub schedule: &'a AnnealSchedule,
    pub coupling_strength: f64,
    pub j_baseline: f64,
    /// Anneal-time axis range in ns.
    pub anneal_range_ns: (f64, f64),
    pub theory_points: usize,
    pub kz_points: &'a [KzPoint],
    pub history: &'a ObservationHistory,
    pub zne_estimates: &'a BTreeMap<u32, f64>,
}

/// Build the figure for the current display.
pub fn build_figure(input: &FigureInput<'_>) -> Figure {
    match input.display {
        GraphDisplay::KinkDensity => kink_density_figure(input),
        GraphDisplay::Schedule => schedule_figure(input.schedule),
        GraphDisplay::Coupling => coupling_figure(input.history, input.zne_estimates),
    }
}

/// Theoretical kink density over log-spaced anneal times. A schedule
/// without a usable critical point yields an empty series and a warning.
pub fn theory_series(
    schedule: &AnnealSchedule,
    j: f64,
    range_ns: (f64, f64),
    points: usize,
) -> (Series, Option<String>) {
    let mut series = Series::new("Theory");
    let times = log_spaced_times(range_ns.0, range_ns.1, points);
    match theoretical_kink_density(&times, j, schedule) {
        Ok(densities) => {
            series.x = times;
            series.y = densities;
            (series, None)
        }
        Err(e) => {
            warn!("Theoretical kink density unavailable for J={}: {}", j, e);
            (series, Some(format!("No theoretical prediction for J={j}: {e}")))
        }
    }
}

fn kink_density_figure(input: &FigureInput<'_>) -> Figure {
    let j = match input.kind {
        ProblemKind::KibbleZurek => input.coupling_strength,
        ProblemKind::ZeroNoise => input.j_baseline,
    };
    let (theory, warning) = theory_series(
        input.schedule,
        j,
        input.anneal_range_ns,
        input.theory_points,
    );
    let mut series = vec![theory];

    match input.kind {
        ProblemKind::KibbleZurek => {
            let mut measured = Series::new("Measured");
            for p in input.kz_points {
                measured.push(p.anneal_time_ns, p.kink_density);
            }
            series.push(measured);
        }
        ProblemKind::ZeroNoise => {
            let mut measured = Series::new("Measured");
            for (t, bucket) in input.history.iter() {
                for obs in bucket {
                    measured.push(f64::from(t), obs.kink_density);
                }
            }
            series.push(measured);

            let mut estimates = Series::new("Zero-noise estimate");
            for (&t, &estimate) in input.zne_estimates {
                estimates.push(f64::from(t), estimate);
            }
            series.push(estimates);
        }
    }

    Figure {
        display: GraphDisplay::KinkDensity,
        axes: ("Annealing time [ns]".into(), "Kink density".into()),
        series,
        warning,
    }
}

fn schedule_figure(schedule: &AnnealSchedule) -> Figure {
    let mut a = Series::new("A(s)");
    let mut b = Series::new("B(s)");
    for p in schedule.points() {
        a.push(p.s, p.a_ghz);
        b.push(p.s, p.b_ghz);
    }
    Figure {
        display: GraphDisplay::Schedule,
        axes: ("Normalized annealing fraction s".into(), "Energy [GHz]".into()),
        series: vec![a, b],
        warning: None,
    }
}

fn coupling_figure(history: &ObservationHistory, estimates: &BTreeMap<u32, f64>) -> Figure {
    let mut series = Vec::new();
    let mut warning = None;

    for (t, bucket) in history.iter() {
        let mut measured = Series::new(format!("{t} ns"));
        for obs in bucket {
            measured.push(obs.lambda, obs.kink_density);
        }
        series.push(measured);

        if bucket.len() < 2 {
            continue;
        }
        match history.fit(t) {
            Ok(curve) => {
                let max_lambda = bucket.iter().map(|o| o.lambda).fold(0.0_f64, f64::max);
                let mut fitted = Series::new(format!("Fit {t} ns"));
                for i in 0..FIT_POINTS {
                    let x = max_lambda * i as f64 / (FIT_POINTS - 1) as f64;
                    fitted.push(x, curve.evaluate(x));
                }
                series.push(fitted);
            }
            Err(e) => {
                warning = Some(format!("Fit at {t} ns failed: {e}"));
            }
        }
    }

    if !estimates.is_empty() {
        let mut zne = Series::new("Zero-noise estimate");
        for &estimate in estimates.values() {
            zne.push(0.0, estimate);
        }
        series.push(zne);
    }

    Figure {
        display: GraphDisplay::Coupling,
        axes: ("Noise level λ".into(), "Kink density".into()),
        series,
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kz_physics::CouplingObservation;

    fn input<'a>(
        display: GraphDisplay,
        schedule: &'a AnnealSchedule,
        history: &'a ObservationHistory,
        estimates: &'a BTreeMap<u32, f64>,
        kz_points: &'a [KzPoint],
    ) -> FigureInput<'a> {
        FigureInput {
            display,
            kind: ProblemKind::KibbleZurek,
            schedule,
            coupling_strength: -1.4,
            j_baseline: -1.8,
            anneal_range_ns: (2.0, 350.0),
            theory_points: 20,
            kz_points,
            history,
            zne_estimates: estimates,
        }
    }

    #[test]
    fn test_kink_density_figure() {
        let schedule = AnnealSchedule::fallback();
        let history = ObservationHistory::new();
        let estimates = BTreeMap::new();
        let points = [KzPoint {
            anneal_time_ns: 7.0,
            kink_density: 0.08,
            coupling_strength: -1.4,
        }];
        let fig = build_figure(&input(GraphDisplay::KinkDensity, &schedule, &history, &estimates, &points));
        assert!(fig.warning.is_none());
        assert_eq!(fig.series[0].len(), 20);
        assert_eq!(fig.series[1].x, vec![7.0]);
    }

    #[test]
    fn test_degenerate_theory_gives_warning() {
        let schedule = AnnealSchedule::fallback();
        let (series, warning) = theory_series(&schedule, 0.0, (2.0, 350.0), 10);
        assert!(series.is_empty());
        assert!(warning.is_some());
    }

    #[test]
    fn test_schedule_figure() {
        let schedule = AnnealSchedule::fallback();
        let fig = schedule_figure(&schedule);
        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[0].len(), schedule.len());
    }

    #[test]
    fn test_coupling_figure_fits_buckets() {
        let mut history = ObservationHistory::new();
        for (lambda, y) in [(0.5, 0.105), (1.0, 0.12)] {
            history.record(
                20,
                CouplingObservation {
                    lambda,
                    kink_density: y,
                    coupling_strength: -1.0,
                },
            );
        }
        let estimates = BTreeMap::from([(20, 0.1)]);
        let fig = coupling_figure(&history, &estimates);
        assert_eq!(fig.series.len(), 3);
        let fitted = &fig.series[1];
        assert_eq!(fitted.len(), FIT_POINTS);
        assert_eq!(fitted.x[0], 0.0);
        assert!((fitted.x[FIT_POINTS - 1] - 1.0).abs() < 1e-12);
        assert!((fitted.y[0] - 0.1).abs() < 1e-12);
    }
}
