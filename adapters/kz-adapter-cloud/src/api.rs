//! Solver API client.
//!
//! A small REST client for a cloud annealing service: solver discovery,
//! problem submission, status queries and answer retrieval. Requests
//! authenticate with an `X-Auth-Token` header.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{CloudError, CloudResult};

/// Solver API client.
pub struct CloudClient {
    /// HTTP client with timeouts configured.
    client: Client,
    /// API base URL (without trailing slash).
    base_url: String,
    /// API token.
    token: String,
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl CloudClient {
    /// Create a client for `base_url` with a request timeout.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> CloudResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(CloudError::MissingToken);
        }
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(CloudError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform a GET request, returning the deserialized JSON body.
    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> CloudResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        self.handle_response(resp).await
    }

    /// Perform a POST request with a JSON body, returning the deserialized JSON body.
    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> CloudResult<T> {
        let url = self.url(path);
        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("X-Auth-Token", &self.token)
            .json(body)
            .send()
            .await?;

        self.handle_response(resp).await
    }

    /// Handle HTTP response: deserialize JSON or return an error.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> CloudResult<T> {
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(CloudError::ProblemNotFound(message)),
                _ => Err(CloudError::ApiError {
                    status: status.as_u16(),
                    message,
                }),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Public API methods
    // -----------------------------------------------------------------------

    /// List online solvers.
    #[instrument(skip(self))]
    pub async fn list_solvers(&self) -> CloudResult<Vec<SolverInfo>> {
        self.get("solvers/remote").await
    }

    /// Submit an Ising problem.
    #[instrument(skip(self, req), fields(solver = %req.solver))]
    pub async fn submit_problem(&self, req: &SubmitRequest) -> CloudResult<ProblemStatus> {
        debug!("Submitting problem with {} couplers", req.data.quadratic.len());
        self.post("problems", req).await
    }

    /// Status of a problem.
    #[instrument(skip(self))]
    pub async fn get_problem(&self, problem_id: &str) -> CloudResult<ProblemStatus> {
        self.get(&format!("problems/{problem_id}")).await
    }

    /// Answer of a completed problem.
    #[instrument(skip(self))]
    pub async fn get_answer(&self, problem_id: &str) -> CloudResult<Answer> {
        self.get(&format!("problems/{problem_id}/answer")).await
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A solver as listed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverInfo {
    /// Solver identifier, e.g. `Advantage_system4.1`.
    pub id: String,
    /// Whether the solver accepts problems.
    #[serde(default = "default_online")]
    pub online: bool,
    pub properties: SolverProperties,
}

fn default_online() -> bool {
    true
}

/// Static solver properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverProperties {
    /// Working couplers.
    pub couplers: Vec<(u32, u32)>,
    /// Fast-anneal time range in microseconds.
    #[serde(default)]
    pub fast_anneal_time_range: Option<(f64, f64)>,
    /// Allowed `num_reads`, `(min, max)`.
    #[serde(default)]
    pub num_reads_range: Option<(u32, u32)>,
}

impl SolverInfo {
    /// Whether the fast-anneal range of this solver covers `range`.
    pub fn covers_fast_anneal(&self, range: (f64, f64)) -> bool {
        self.properties
            .fast_anneal_time_range
            .is_some_and(|(min, max)| min <= range.0 && max >= range.1)
    }
}

/// Ising problem in the wire format: linear and quadratic terms keyed by
/// variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemData {
    pub linear: BTreeMap<u32, f64>,
    pub quadratic: Vec<(u32, u32, f64)>,
}

/// Solver parameters of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitParams {
    pub annealing_time: f64,
    pub num_reads: u32,
    pub fast_anneal: bool,
    pub auto_scale: bool,
    pub answer_mode: String,
}

/// Body of a problem submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub solver: String,
    #[serde(rename = "type")]
    pub problem_type: String,
    pub data: ProblemData,
    pub params: SubmitParams,
    pub label: String,
}

/// Status record of a problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemStatus {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub submitted_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Answer of a completed problem in raw answer mode: one row per read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub active_variables: Vec<u32>,
    pub solutions: Vec<Vec<i8>>,
    #[serde(default)]
    pub energies: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            CloudClient::new("https://example.invalid", "", Duration::from_secs(1)),
            Err(CloudError::MissingToken)
        ));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client =
            CloudClient::new("https://example.invalid/sapi/v2/", "t", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url(), "https://example.invalid/sapi/v2");
        assert_eq!(
            client.url("/problems/p1"),
            "https://example.invalid/sapi/v2/problems/p1"
        );
        assert!(!format!("{client:?}").contains("\"t\""));
    }

    #[test]
    fn test_solver_info_deserialize() {
        let json = r#"{
            "id": "Advantage_system4.1",
            "properties": {
                "couplers": [[0, 1], [1, 2]],
                "fast_anneal_time_range": [0.005, 83000.0]
            }
        }"#;
        let solver: SolverInfo = serde_json::from_str(json).unwrap();
        assert!(solver.online);
        assert_eq!(solver.properties.couplers, vec![(0, 1), (1, 2)]);
        assert!(solver.covers_fast_anneal((0.005, 0.1)));
        assert!(!solver.covers_fast_anneal((0.001, 0.1)));
    }

    #[test]
    fn test_solver_without_fast_anneal() {
        let json = r#"{"id": "old", "properties": {"couplers": []}}"#;
        let solver: SolverInfo = serde_json::from_str(json).unwrap();
        assert!(!solver.covers_fast_anneal((0.005, 0.1)));
    }

    #[test]
    fn test_submit_request_serialize() {
        let req = SubmitRequest {
            solver: "qpu".into(),
            problem_type: "ising".into(),
            data: ProblemData::default(),
            params: SubmitParams {
                annealing_time: 0.007,
                num_reads: 100,
                fast_anneal: true,
                auto_scale: false,
                answer_mode: "raw".into(),
            },
            label: "x".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "ising");
        assert_eq!(json["params"]["answer_mode"], "raw");
        assert_eq!(json["params"]["fast_anneal"], true);
    }
}
