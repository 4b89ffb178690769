//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use tasklane_auth::PublicUser;
use tasklane_db::{Task, TaskStatus};

// ==================== Auth Types ====================

/// Register request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register/login response
///
/// The refresh token travels only in the cookie; the access token is also
/// returned here for clients that send it as a bearer header.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub message: &'static str,
    pub user: PublicUser,
    pub access_token: String,
    pub expires_in: i64,
}

/// Refresh response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub message: &'static str,
    pub access_token: String,
    pub expires_in: i64,
}

/// Generic message response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ==================== Task Types ====================

/// Create task request
#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Update task request
#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Task list query parameters
#[derive(Deserialize, Default)]
pub struct TaskListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// Task with a confirmation message
#[derive(Serialize)]
pub struct TaskResponse {
    pub message: &'static str,
    pub task: Task,
}

/// Pagination metadata
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// Paginated task list
#[derive(Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}
