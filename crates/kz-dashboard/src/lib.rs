//! Kibble-Zurek Dashboard - HTTP back-end for annealing experiments.
//!
//! This crate serves the JSON API behind the dashboard. A single
//! [`kz_sched::Session`] holds the user's context; the client selects a
//! sampler, sets the ring size, coupling strength and anneal time, submits,
//! and then ticks the poll timer at the interval reported in every
//! session view until the job reaches a terminal state.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kz_dashboard::{AppState, DashboardConfig, build_registry, create_router};
//! use kz_sched::{Config, CycleSearchFinder, MemoryEmbeddingStore, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let registry = build_registry(&config).await;
//!     let finder = Arc::new(CycleSearchFinder::new(config.embedding_timeout()));
//!     let mut session =
//!         Session::new(config, registry, Arc::new(MemoryEmbeddingStore::new()), finder);
//!     session.start().await?;
//!
//!     let dashboard = DashboardConfig::default();
//!     let app = create_router(Arc::new(AppState::with_config(session, dashboard.clone())));
//!     let listener = tokio::net::TcpListener::bind(dashboard.bind_address).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod dto;
pub mod error;
pub mod registry;
pub mod server;
pub mod state;

pub use dto::{HealthResponse, SamplerSummary, SelectSamplerRequest, SpinsResponse};
pub use error::ApiError;
pub use registry::build_registry;
pub use server::{create_router, run_poll_timer};
pub use state::{AppState, DashboardConfig};
