//! Tasklane REST API
//!
//! This crate provides the Axum-based HTTP API for Tasklane: the
//! authentication endpoints and the per-user task endpoints.

pub mod cookie;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, CookieSettings, MetricsHandle};
