//! Sampler listing endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::dto::SamplerSummary;
use crate::state::AppState;

/// GET /api/samplers - List registered samplers in registration order.
pub async fn list_samplers(State(state): State<Arc<AppState>>) -> Json<Vec<SamplerSummary>> {
    let session = state.session.lock().await;
    let selected = session.sampler_name();
    let summaries = session
        .registry()
        .iter()
        .map(|s| SamplerSummary::from_sampler(s.as_ref(), Some(s.name()) == selected))
        .collect();
    Json(summaries)
}
