//! Axum server setup and routing.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, warn};

use crate::api;
use crate::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(api::health::health))
        .route("/samplers", get(api::samplers::list_samplers))
        .route("/session", get(api::session::get_session))
        .route("/session/sampler", post(api::session::select_sampler))
        .route("/session/parameters", post(api::session::update_parameters))
        .route("/session/submit", post(api::session::submit))
        .route("/session/tick", post(api::session::tick))
        .route("/session/dismiss-error", post(api::session::dismiss_error))
        .route("/session/figure", get(api::session::figure))
        .route("/session/spins", get(api::session::spins));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins; any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Drive the session's poll timer from the server.
///
/// Sleeps for the interval the lifecycle last requested and ticks while
/// the timer is enabled. Used when the client does not tick by itself.
pub async fn run_poll_timer(state: Arc<AppState>) {
    loop {
        let interval = {
            let mut session = state.session.lock().await;
            let timer = session.timer();
            if !timer.disabled {
                if let Err(e) = session.tick().await {
                    warn!("Poll tick failed: {}", e);
                }
            }
            session.timer().interval_ms
        };
        debug!("Next poll in {} ms", interval);
        tokio::time::sleep(Duration::from_millis(interval.max(50))).await;
    }
}
