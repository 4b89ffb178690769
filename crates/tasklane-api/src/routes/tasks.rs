//! Task routes
//!
//! All handlers run behind the authentication middleware and scope every
//! query by the caller's user id. Someone else's task is reported exactly
//! like a missing one.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tasklane_db::{NewTask, Task, TaskQuery, UpdateTask};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery, RequireAuth};
use crate::state::AppState;

use super::types::{
    CreateTaskRequest, MessageResponse, Pagination, TaskListQuery, TaskListResponse, TaskResponse,
    UpdateTaskRequest,
};

// ==================== Input Validation ====================

/// Maximum allowed title length
const MAX_TITLE_LENGTH: usize = 200;
/// Maximum page size for listings
const MAX_PAGE_LIMIT: i64 = 100;

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::Validation("Title too long".to_string()));
    }
    Ok(())
}

fn validate_list_query(query: &TaskListQuery) -> Result<(), ApiError> {
    if query.page < 1 {
        return Err(ApiError::Validation("Page must be greater than 0".to_string()));
    }
    if query.limit < 1 || query.limit > MAX_PAGE_LIMIT {
        return Err(ApiError::Validation(format!(
            "Limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(())
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

// ==================== Task Routes ====================

/// GET /tasks
async fn list_tasks(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TaskListQuery>,
) -> Result<Json<TaskListResponse>, ApiError> {
    validate_list_query(&query)?;

    let task_query = TaskQuery {
        page: query.page,
        limit: query.limit,
        status: query.status,
        search: query.search,
    };

    let (tasks, total) = state.db.list_tasks(user.id, &task_query).await?;

    Ok(Json(TaskListResponse {
        tasks,
        pagination: Pagination {
            total,
            page: task_query.page,
            limit: task_query.limit,
            total_pages: tasklane_db::utils::total_pages(total, task_query.limit),
        },
    }))
}

/// GET /tasks/{id}
async fn get_task(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .db
        .get_task(id, user.id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// POST /tasks
async fn create_task(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    validate_title(&request.title)?;

    let task = state
        .db
        .insert_task(NewTask {
            user_id: user.id,
            title: request.title,
            description: request.description,
            status: request.status.unwrap_or_default(),
        })
        .await?;

    info!("User {} created task {}", user.id, task.id);

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created",
            task,
        }),
    ))
}

/// PATCH /tasks/{id}
async fn update_task(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    if let Some(title) = &request.title {
        validate_title(title)?;
    }

    debug!("User {} updating task {}", user.id, id);

    let task = state
        .db
        .update_task(
            id,
            user.id,
            UpdateTask {
                title: request.title,
                description: request.description,
                status: request.status,
            },
        )
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(TaskResponse {
        message: "Task updated",
        task,
    }))
}

/// DELETE /tasks/{id}
async fn delete_task(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.db.delete_task(id, user.id).await? {
        return Err(task_not_found());
    }

    info!("User {} deleted task {}", user.id, id);

    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}

/// POST /tasks/{id}/toggle
async fn toggle_task(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .db
        .toggle_task_status(id, user.id)
        .await?
        .ok_or_else(task_not_found)?;

    debug!("User {} toggled task {} to {}", user.id, id, task.status.as_str());

    Ok(Json(TaskResponse {
        message: "Task status toggled",
        task,
    }))
}

/// Create task routes (mounted behind the authentication middleware)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).patch(update_task).delete(delete_task))
        .route("/tasks/{id}/toggle", post(toggle_task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Buy milk").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"t".repeat(MAX_TITLE_LENGTH)).is_ok());
        assert!(validate_title(&"t".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_list_query() {
        let query = |page, limit| TaskListQuery {
            page,
            limit,
            ..Default::default()
        };

        assert!(validate_list_query(&query(1, 10)).is_ok());
        assert!(validate_list_query(&query(i64::MAX, 100)).is_ok());
        assert!(validate_list_query(&query(0, 10)).is_err());
        assert!(validate_list_query(&query(1, 0)).is_err());
        assert!(validate_list_query(&query(1, 101)).is_err());
    }
}
