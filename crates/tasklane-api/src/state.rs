//! Application state

use axum::extract::FromRef;
use chrono::Duration;
use std::sync::Arc;
use tasklane_auth::{SessionManager, TokenCodec};
use tasklane_db::Database;

/// Prometheus handle used to render `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Attributes for the refresh-token cookie
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Add the `Secure` attribute (production deployments behind TLS)
    pub secure: bool,
    /// Cookie lifetime
    pub max_age: Duration,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            max_age: Duration::days(7),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<SessionManager>,
    pub tokens: Arc<TokenCodec>,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(
        db: Database,
        sessions: Arc<SessionManager>,
        tokens: Arc<TokenCodec>,
        cookies: CookieSettings,
    ) -> Self {
        Self {
            db,
            sessions,
            tokens,
            cookies,
        }
    }
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
