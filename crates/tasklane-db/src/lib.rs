//! Tasklane Database Layer
//!
//! This crate provides the persistence layer for Tasklane: user identity
//! records (including the current refresh-token slot) and per-user tasks,
//! stored in SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, TaskQuery};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
