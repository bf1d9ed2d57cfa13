//! Kibble-Zurek Dashboard binary entry point.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kz_dashboard::{AppState, DashboardConfig, build_registry, create_router, run_poll_timer};
use kz_sched::{Config, CycleSearchFinder, JsonEmbeddingStore, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kz_dashboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Dashboard configuration
    let mut dashboard = DashboardConfig::default();
    if let Ok(bind) = std::env::var("KZ_BIND") {
        dashboard.bind_address = bind
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid KZ_BIND address '{bind}': {e}"))?;
    }
    if let Ok(v) = std::env::var("KZ_AUTO_TICK") {
        dashboard.auto_tick = v
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid KZ_AUTO_TICK value '{v}': {e}"))?;
    }
    if let Ok(origins) = std::env::var("KZ_CORS_ORIGINS") {
        dashboard.cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }
    let bind_addr = dashboard.bind_address;

    // Experiment configuration
    let config_file = std::env::var("KZ_CONFIG").ok().map(PathBuf::from);
    let config = Config::load(config_file.as_deref())?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let registry = build_registry(&config).await;
    let repository = Arc::new(JsonEmbeddingStore::new(&config.embeddings_dir).await?);
    tracing::info!(
        "Embedding cache directory: {}",
        repository.base_dir().display()
    );
    let finder = Arc::new(CycleSearchFinder::new(config.embedding_timeout()));

    let mut session = Session::new(config, registry, repository, finder);
    session.start().await?;

    let state = Arc::new(AppState::with_config(session, dashboard));

    if state.config.auto_tick {
        let timer_state = Arc::clone(&state);
        tokio::spawn(async move {
            run_poll_timer(timer_state).await;
        });
        tracing::info!("Server-side poll timer enabled");
    }

    let app = create_router(state);

    tracing::info!("Starting Kibble-Zurek Dashboard at http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
