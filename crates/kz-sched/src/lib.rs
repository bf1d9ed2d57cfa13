//! Job orchestration for Kibble-Zurek annealing experiments.
//!
//! This crate connects the samplers of `kz-hal` with the physics of
//! `kz-physics`:
//!
//! - [`embedding`]: one-to-one ring embeddings, their cache and the
//!   deadline-bounded cycle search
//! - [`persistence`]: embedding repositories (JSON files, in-memory)
//! - [`schedules`]: anneal-schedule catalog with fallback
//! - [`lifecycle`]: the submission state machine, one pure [`step`] per
//!   trigger
//! - [`session`]: per-user context applying step side effects
//! - [`figure`]: plot series for the dashboard
//! - [`config`]: YAML and environment configuration
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use kz_sched::{Config, CycleSearchFinder, MemoryEmbeddingStore, Session};
//!
//! let config = Config::default();
//! let finder = Arc::new(CycleSearchFinder::new(config.embedding_timeout()));
//! let mut session = Session::new(config, registry, Arc::new(MemoryEmbeddingStore::new()), finder);
//! session.start().await?;
//! session.submit().await?;
//! while session.state().is_running() {
//!     tokio::time::sleep(Duration::from_millis(session.timer().interval_ms)).await;
//!     session.tick().await?;
//! }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod figure;
pub mod lifecycle;
pub mod persistence;
pub mod schedules;
pub mod session;

pub use config::{AnnealTimeRange, CloudConfig, Config, ConfigError, PollingConfig};
pub use embedding::{
    CycleSearchFinder, Embedding, EmbeddingCache, EmbeddingFinder, find_one_to_one_embedding,
};
pub use error::{SchedError, SchedResult};
pub use figure::{Figure, GraphDisplay, KzPoint, ProblemKind, Series, build_figure, theory_series};
pub use lifecycle::{
    EmbeddingSignal, SamplerStatus, StatusSource, StepInput, StepOutput, SubmitState, Trigger,
    step,
};
pub use persistence::{EmbeddingRepository, JsonEmbeddingStore, MemoryEmbeddingStore};
pub use schedules::{FALLBACK_SCHEDULE_NAME, ScheduleCatalog, ScheduleMatch, ScheduleSelection};
pub use session::{
    JobRecord, JobResult, ParameterUpdate, Parameters, PollTimer, Session, SessionSnapshot,
};
