//! Session endpoints: sampler choice, parameters, submission and polling.

use std::sync::Arc;

use axum::{Json, extract::State};
use kz_sched::{Figure, ParameterUpdate, SessionSnapshot};
use tracing::debug;

use crate::dto::{SelectSamplerRequest, SpinsResponse, kink_positions};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/session - Current session view.
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

/// POST /api/session/sampler - Switch to another sampler.
pub async fn select_sampler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectSamplerRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut session = state.session.lock().await;
    session.select_sampler(&req.name).await?;
    Ok(Json(session.snapshot()))
}

/// POST /api/session/parameters - Update experiment parameters.
pub async fn update_parameters(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ParameterUpdate>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut session = state.session.lock().await;
    session.set_parameters(update)?;
    Ok(Json(session.snapshot()))
}

/// POST /api/session/submit - Submit button click.
pub async fn submit(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut session = state.session.lock().await;
    let next = session.submit().await?;
    debug!("Submit -> {}", next);
    Ok(Json(session.snapshot()))
}

/// POST /api/session/tick - One poll-timer tick.
pub async fn tick(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut session = state.session.lock().await;
    session.tick().await?;
    Ok(Json(session.snapshot()))
}

/// POST /api/session/dismiss-error - Close the error dialog.
pub async fn dismiss_error(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.dismiss_error_modal();
    Json(session.snapshot())
}

/// GET /api/session/figure - Series for the selected graph.
pub async fn figure(State(state): State<Arc<AppState>>) -> Json<Figure> {
    Json(state.session.lock().await.figure())
}

/// GET /api/session/spins - Representative spins of the last job.
pub async fn spins(State(state): State<Arc<AppState>>) -> Result<Json<SpinsResponse>, ApiError> {
    let session = state.session.lock().await;
    let result = session
        .last_result()
        .ok_or_else(|| ApiError::NotFound("No completed job".to_string()))?;
    let coupling_strength = result.coupling_strength;

    Ok(Json(SpinsResponse {
        kinks: kink_positions(&result.representative, coupling_strength),
        spins: result.representative.clone(),
        coupling_strength,
        kink_density: result.stats.mean_kink_density,
    }))
}
