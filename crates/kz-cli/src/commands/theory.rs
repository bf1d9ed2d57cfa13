//! Theory command implementation.

use anyhow::{Context, Result};
use console::style;
use serde_json::json;

use kz_physics::{AnnealSchedule, log_spaced_times, theoretical_kink_density};

/// Execute the theory command.
pub fn execute(
    coupling_strength: f64,
    range_ns: (f64, f64),
    points: usize,
    schedule_path: Option<&str>,
    as_json: bool,
) -> Result<()> {
    let (min_ns, max_ns) = range_ns;
    if !(min_ns > 0.0 && min_ns < max_ns) {
        anyhow::bail!("Invalid anneal-time range: [{min_ns}, {max_ns}] ns");
    }

    let schedule = match schedule_path {
        Some(path) => AnnealSchedule::from_csv_path(path)
            .with_context(|| format!("Failed to read schedule: {path}"))?,
        None => AnnealSchedule::fallback(),
    };

    let critical = schedule.critical_point(coupling_strength)?;
    let rate = schedule.kz_rate(coupling_strength)?;
    let times = log_spaced_times(min_ns, max_ns, points);
    let densities = theoretical_kink_density(&times, coupling_strength, &schedule)?;

    if as_json {
        let output = json!({
            "coupling_strength": coupling_strength,
            "critical_s": critical.s,
            "kz_rate": rate,
            "anneal_time_ns": times,
            "kink_density": densities,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} Theoretical kink density for J = {}",
        style("→").cyan().bold(),
        style(coupling_strength).yellow()
    );
    println!(
        "  Critical point: s = {:.4}, b = {:.4e}",
        critical.s, rate
    );
    println!(
        "  Schedule: {}",
        schedule_path.unwrap_or("built-in")
    );
    println!();
    println!("  {:>12}  {:>12}", "t [ns]", "density");
    println!("  {}", "-".repeat(26));
    for (t, n) in times.iter().zip(&densities) {
        println!("  {t:>12.2}  {n:>12.5}");
    }

    Ok(())
}
