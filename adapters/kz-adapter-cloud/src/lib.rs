//! Cloud Quantum Annealer Adapter
//!
//! This crate provides a sampler implementation for quantum annealers
//! hosted behind a solver REST API. Solvers are discovered at start-up and
//! only those supporting the fast-anneal protocol over the configured range
//! are offered.
//!
//! # Authentication
//!
//! Set the `KZ_API_TOKEN` environment variable to your API token:
//!
//! ```bash
//! export KZ_API_ENDPOINT="https://cloud.example/sapi/v2"
//! export KZ_API_TOKEN="your-token"
//! ```
//!
//! # Endpoints
//!
//! | Method | Path                    | Use                           |
//! |--------|-------------------------|-------------------------------|
//! | `GET`  | `solvers/remote`        | solver discovery and couplers |
//! | `POST` | `problems`              | submit an Ising problem       |
//! | `GET`  | `problems/{id}`         | status and label              |
//! | `GET`  | `problems/{id}/answer`  | raw samples                   |
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use kz_adapter_cloud::CloudSampler;
//!
//! let samplers = CloudSampler::connect(
//!     "https://cloud.example/sapi/v2",
//!     &token,
//!     (0.005, 0.1),
//!     Duration::from_secs(30),
//! )
//! .await?;
//! ```

mod api;
mod error;
mod sampler;

pub use api::{
    Answer, CloudClient, ProblemData, ProblemStatus, SolverInfo, SolverProperties, SubmitParams,
    SubmitRequest,
};
pub use error::{CloudError, CloudResult};
pub use sampler::CloudSampler;
