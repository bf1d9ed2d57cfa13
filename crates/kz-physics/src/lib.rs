//! Physics of the Kibble-Zurek spin-ring experiment.
//!
//! A ring of N spins with uniform coupling J is annealed through its
//! quantum phase transition. The faster the anneal, the more defects
//! ("kinks") freeze into the final state; the Kibble-Zurek mechanism
//! predicts the kink density to scale as t_a^(-1/2).
//!
//! This crate provides:
//! - [`ring`]: the spin-ring model builder
//! - [`schedule`]: anneal schedules A(s), B(s) and their critical point
//! - [`kink`]: measured and predicted kink densities
//! - [`lambda`]: the time-rescaling factor for a coupling strength
//! - [`zne`]: zero-noise extrapolation fits and the observation history
//!
//! # Example
//!
//! ```rust
//! use kz_physics::ring::build_ring;
//! use kz_physics::schedule::AnnealSchedule;
//! use kz_physics::kink::theoretical_kink_density;
//!
//! let ring = build_ring(512, -1.4).unwrap();
//! assert_eq!(ring.couplings().len(), 512);
//!
//! let schedule = AnnealSchedule::fallback();
//! let theory = theoretical_kink_density(&[5.0, 50.0], -1.4, &schedule).unwrap();
//! assert!(theory[0] > theory[1]);
//! ```

pub mod error;
pub mod kink;
pub mod lambda;
pub mod ring;
pub mod schedule;
pub mod zne;

pub use error::{PhysicsError, PhysicsResult};
pub use kink::{KinkStats, kink_stats, kink_stats_rows, log_spaced_times, theoretical_kink_density};
pub use lambda::compute_lambda;
pub use ring::{SpinRingModel, build_ring};
pub use schedule::{AnnealSchedule, CriticalPoint, SchedulePoint};
pub use zne::{CouplingObservation, FittedCurve, ObservationHistory, RefitOutcome, fit_extrapolation};
