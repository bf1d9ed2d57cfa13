//! Anneal-time rescaling for coupling strength.
//!
//! The predicted kink density depends on the anneal time t only through
//! t·b(J), where b is the rate constant at the critical point. Annealing a
//! ring with coupling J for λ·t, with λ = b(J_baseline) / b(J), therefore
//! reproduces the dynamics of the baseline coupling at time t. Weakening
//! |J| at fixed λ·t is what zero-noise extrapolation varies.

use tracing::debug;

use crate::error::PhysicsResult;
use crate::schedule::AnnealSchedule;

/// Rescaling factor λ for coupling `j` relative to `j_baseline` on
/// `schedule`. Continuous in J; exactly 1 at the baseline.
pub fn compute_lambda(j: f64, schedule: &AnnealSchedule, j_baseline: f64) -> PhysicsResult<f64> {
    if j.abs() == j_baseline.abs() {
        return Ok(1.0);
    }
    let baseline = schedule.kz_rate_continuous(j_baseline)?;
    let rate = schedule.kz_rate_continuous(j)?;
    let lambda = baseline / rate;
    debug!(j, j_baseline, lambda, "Computed anneal-time rescaling");
    Ok(lambda)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhysicsError;

    #[test]
    fn test_lambda_is_one_at_baseline() {
        let schedule = AnnealSchedule::fallback();
        assert_eq!(compute_lambda(-1.8, &schedule, -1.8).unwrap(), 1.0);
        // Only |J| enters the critical point.
        assert_eq!(compute_lambda(1.8, &schedule, -1.8).unwrap(), 1.0);
    }

    #[test]
    fn test_lambda_is_continuous_near_baseline() {
        let schedule = AnnealSchedule::fallback();
        let near = compute_lambda(-1.8 + 1e-7, &schedule, -1.8).unwrap();
        assert!((near - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_lambda_is_monotone_in_coupling() {
        let schedule = AnnealSchedule::fallback();
        let mut previous = f64::INFINITY;
        for k in 1..=12 {
            let j = -0.2 * k as f64;
            let lambda = compute_lambda(j, &schedule, -1.8).unwrap();
            assert!(lambda.is_finite() && lambda > 0.0);
            assert!(lambda < previous, "lambda not decreasing at J = {j}");
            previous = lambda;
        }
    }

    #[test]
    fn test_lambda_without_critical_point() {
        let schedule = AnnealSchedule::fallback();
        assert!(matches!(
            compute_lambda(0.0, &schedule, -1.8),
            Err(PhysicsError::DegenerateSchedule { .. })
        ));
    }
}
