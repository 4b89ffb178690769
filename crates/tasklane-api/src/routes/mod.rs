//! API routes

mod auth;
mod health;
pub mod metrics;
mod tasks;
pub mod types;


use axum::{Router, middleware};
use std::sync::Arc;
use tasklane_auth::auth_middleware;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    // Everything here requires a valid access token
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(tasks::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<AppState>,
        ));

    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Register, login, refresh
        .merge(auth::routes())
        .merge(protected)
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
