//! Integration tests for the Kibble-Zurek Dashboard API.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use kz_adapter_classical::{ClassicalConfig, ClassicalSampler};
use kz_dashboard::{AppState, DashboardConfig, create_router};
use kz_hal::SamplerRegistry;
use kz_sched::{Config, CycleSearchFinder, MemoryEmbeddingStore, Session};
use serde_json::{Value, json};

// ============================================================================
// Test helpers
// ============================================================================

fn config(dir: &tempfile::TempDir) -> Config {
    Config {
        schedules_dir: dir.path().to_path_buf(),
        num_reads: 10,
        ..Config::default()
    }
}

fn classical_registry() -> SamplerRegistry {
    let mut registry = SamplerRegistry::new();
    registry.register(Arc::new(ClassicalSampler::with_config(ClassicalConfig {
        seed: Some(3),
        ..ClassicalConfig::default()
    })));
    registry
}

async fn test_server_with(registry: SamplerRegistry) -> (TestServer, tempfile::TempDir) {
    test_server_with_config(registry, DashboardConfig::default()).await
}

async fn test_server_with_config(
    registry: SamplerRegistry,
    dashboard: DashboardConfig,
) -> (TestServer, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = Session::new(
        config(&dir),
        registry,
        Arc::new(MemoryEmbeddingStore::new()),
        Arc::new(CycleSearchFinder::new(Duration::from_secs(5))),
    );
    session.start().await.expect("session start");
    let router = create_router(Arc::new(AppState::with_config(session, dashboard)));
    (TestServer::new(router).expect("test server"), dir)
}

async fn test_server() -> (TestServer, tempfile::TempDir) {
    test_server_with(classical_registry()).await
}

async fn set_ring(server: &TestServer, ring_size: usize) {
    server
        .post("/api/session/parameters")
        .json(&json!({ "ring_size": ring_size }))
        .await
        .assert_status_ok();
}

// ============================================================================
// Health and samplers
// ============================================================================

#[tokio::test]
async fn test_health_returns_ok() {
    let (server, _dir) = test_server().await;
    let response = server.get("/api/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_list_samplers() {
    let (server, _dir) = test_server().await;
    let body: Value = server.get("/api/samplers").await.json();

    let samplers = body.as_array().unwrap();
    assert_eq!(samplers.len(), 1);
    assert_eq!(samplers[0]["name"], "Diffusion [Classical]");
    assert_eq!(samplers[0]["classical"], true);
    assert_eq!(samplers[0]["selected"], true);
    assert_eq!(samplers[0]["num_qubits"], 256);
}

#[tokio::test]
async fn test_select_unknown_sampler_returns_404() {
    let (server, _dir) = test_server().await;
    let response = server
        .post("/api/session/sampler")
        .json(&json!({ "name": "Advantage_missing" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let (server, _dir) = test_server().await;
    let response = server
        .get("/api/health")
        .add_header(ORIGIN, HeaderValue::from_static("http://elsewhere.example"))
        .await;
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("*"))
    );
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origins() {
    let dashboard = DashboardConfig {
        cors_origins: vec!["http://lab.example".to_string()],
        ..DashboardConfig::default()
    };
    let (server, _dir) = test_server_with_config(classical_registry(), dashboard).await;

    let allowed = server
        .get("/api/health")
        .add_header(ORIGIN, HeaderValue::from_static("http://lab.example"))
        .await;
    assert_eq!(
        allowed.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("http://lab.example"))
    );

    let denied = server
        .get("/api/health")
        .add_header(ORIGIN, HeaderValue::from_static("http://elsewhere.example"))
        .await;
    assert!(denied.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

// ============================================================================
// Session view and parameters
// ============================================================================

#[tokio::test]
async fn test_initial_session() {
    let (server, _dir) = test_server().await;
    let body: Value = server.get("/api/session").await.json();

    assert_eq!(body["state"], "READY");
    assert_eq!(body["sampler"], "Diffusion [Classical]");
    assert_eq!(body["classical"], true);
    assert_eq!(body["schedule_file"], "FALLBACK_SCHEDULE.csv");
    assert_eq!(body["timer"]["disabled"], true);
    assert_eq!(body["params"]["ring_size"], 512);
    assert_eq!(body["inputs_disabled"], false);
}

#[tokio::test]
async fn test_update_parameters() {
    let (server, _dir) = test_server().await;
    let response = server
        .post("/api/session/parameters")
        .json(&json!({ "ring_size": 64, "coupling_strength": -1.0, "kind": "zero_noise" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["params"]["ring_size"], 64);
    assert_eq!(body["params"]["coupling_strength"], -1.0);
    assert_eq!(body["params"]["kind"], "zero_noise");
    assert_eq!(body["params"]["anneal_time_ns"], 7);
}

#[tokio::test]
async fn test_invalid_ring_size_returns_400() {
    let (server, _dir) = test_server().await;
    let response = server
        .post("/api/session/parameters")
        .json(&json!({ "ring_size": 2 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_anneal_time_out_of_range_returns_400() {
    let (server, _dir) = test_server().await;
    let response = server
        .post("/api/session/parameters")
        .json(&json!({ "anneal_time_ns": 1000 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Submission cycle
// ============================================================================

#[tokio::test]
async fn test_classical_submission_cycle() {
    let (server, _dir) = test_server().await;
    set_ring(&server, 32).await;

    let body: Value = server.post("/api/session/submit").await.json();
    assert_eq!(body["state"], "SUBMITTED");
    assert_eq!(body["submit_disabled"], true);
    assert_eq!(body["inputs_disabled"], true);
    assert_eq!(body["timer"]["disabled"], false);
    assert_eq!(body["classical_warning"], true);
    assert!(body["job_id"].as_str().is_some());

    let body: Value = server.post("/api/session/tick").await.json();
    assert_eq!(body["state"], "COMPLETED");
    assert_eq!(body["timer"]["interval_ms"], 1000);
    let density = body["kink_density"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&density));

    let body: Value = server.post("/api/session/tick").await.json();
    assert_eq!(body["state"], "COMPLETED");
    assert_eq!(body["timer"]["disabled"], true);
    assert_eq!(body["submit_disabled"], false);

    let spins: Value = server.get("/api/session/spins").await.json();
    assert_eq!(spins["spins"].as_array().unwrap().len(), 32);
    assert_eq!(spins["coupling_strength"], -1.4);
    assert!(spins["kinks"].as_array().is_some());
}

#[tokio::test]
async fn test_parameters_locked_while_running() {
    let (server, _dir) = test_server().await;
    set_ring(&server, 16).await;
    server.post("/api/session/submit").await.assert_status_ok();

    let response = server
        .post("/api/session/parameters")
        .json(&json!({ "ring_size": 32 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let body: Value = response.json();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_tick_without_submission_is_ignored() {
    let (server, _dir) = test_server().await;
    let body: Value = server.post("/api/session/tick").await.json();
    assert_eq!(body["state"], "READY");
    assert_eq!(body["timer"]["ticks"], 0);
}

#[tokio::test]
async fn test_spins_before_any_job_returns_404() {
    let (server, _dir) = test_server().await;
    server
        .get("/api/session/spins")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_no_solver() {
    let (server, _dir) = test_server_with(SamplerRegistry::new()).await;

    let body: Value = server.get("/api/session").await.json();
    assert_eq!(body["state"], "NO SOLVER");

    let body: Value = server.post("/api/session/submit").await.json();
    assert_eq!(body["state"], "NO SOLVER");
    assert_eq!(body["no_solver"], true);
}

#[tokio::test]
async fn test_spins_keep_job_coupling_after_parameter_change() {
    let (server, _dir) = test_server().await;
    set_ring(&server, 32).await;
    server.post("/api/session/submit").await.assert_status_ok();
    server.post("/api/session/tick").await.assert_status_ok();

    let before: Value = server.get("/api/session/spins").await.json();
    server
        .post("/api/session/parameters")
        .json(&json!({ "coupling_strength": 1.4 }))
        .await
        .assert_status_ok();
    let after: Value = server.get("/api/session/spins").await.json();

    assert_eq!(after["coupling_strength"], -1.4);
    assert_eq!(before["kinks"], after["kinks"]);
    assert_eq!(before["kink_density"], after["kink_density"]);
}

// ============================================================================
// Figures
// ============================================================================

#[tokio::test]
async fn test_kink_density_figure_has_theory_curve() {
    let (server, _dir) = test_server().await;
    let body: Value = server.get("/api/session/figure").await.json();

    assert_eq!(body["display"], "kink_density");
    let theory = body["series"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "Theory")
        .expect("theory series");
    assert_eq!(theory["x"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn test_schedule_figure() {
    let (server, _dir) = test_server().await;
    server
        .post("/api/session/parameters")
        .json(&json!({ "display": "schedule" }))
        .await
        .assert_status_ok();

    let body: Value = server.get("/api/session/figure").await.json();
    assert_eq!(body["display"], "schedule");
    let names: Vec<&str> = body["series"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(names, ["A(s)", "B(s)"]);
}
