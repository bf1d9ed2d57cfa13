//! Application state for the dashboard server.

use std::net::SocketAddr;

use kz_sched::Session;
use tokio::sync::Mutex;

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,
    /// Drive the poll timer on the server instead of waiting for
    /// `POST /api/session/tick` from the client.
    pub auto_tick: bool,
    /// Origins allowed by CORS; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_address: ([127, 0, 0, 1], 8050).into(),
            auto_tick: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Shared application state.
///
/// The dashboard serves a single user context. Every handler locks the
/// session for the whole request, so a tick never interleaves with a
/// submit or a parameter change.
pub struct AppState {
    /// The user's session.
    pub session: Mutex<Session>,
    /// Dashboard configuration.
    pub config: DashboardConfig,
}

impl AppState {
    /// Create application state with default configuration.
    pub fn new(session: Session) -> Self {
        Self::with_config(session, DashboardConfig::default())
    }

    /// Create application state with custom configuration.
    pub fn with_config(session: Session, config: DashboardConfig) -> Self {
        Self {
            session: Mutex::new(session),
            config,
        }
    }
}
