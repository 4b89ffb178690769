//! Task operations
//!
//! Every lookup and mutation is scoped by the owning user id, so a task that
//! belongs to someone else behaves exactly like a task that does not exist.

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewTask, Task, TaskStatus, UpdateTask};
use crate::repository::Database;
use crate::utils::format_timestamp;

/// Query parameters for listing tasks
#[derive(Debug, Clone)]
pub struct TaskQuery {
    /// 1-based page number
    pub page: i64,
    /// Page size
    pub limit: i64,
    /// Filter by status
    pub status: Option<TaskStatus>,
    /// Substring match on title or description (ASCII case-insensitive)
    pub search: Option<String>,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            status: None,
            search: None,
        }
    }
}

impl TaskQuery {
    /// Rows to skip; saturates so a huge page yields an empty result
    fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit.max(0))
    }
}

/// Escape LIKE wildcards so a search term matches literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl Database {
    // ==================== Task Operations ====================

    /// Insert a new task
    pub async fn insert_task(&self, task: NewTask) -> Result<Task, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (user_id, title, description, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(format_timestamp(&now))
        .bind(format_timestamp(&now))
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Task {
            id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            status: task.status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a task by ID, only if it belongs to `user_id`
    pub async fn get_task(&self, id: i64, user_id: i64) -> Result<Option<Task>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, user_id, title, description, status, created_at, updated_at
            FROM tasks
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Task::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List a user's tasks with filtering and pagination, newest first
    ///
    /// Returns the requested page together with the total number of matches.
    pub async fn list_tasks(
        &self,
        user_id: i64,
        query: &TaskQuery,
    ) -> Result<(Vec<Task>, i64), DbError> {
        let mut conditions = vec!["user_id = ?"];
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = query.status {
            conditions.push("status = ?");
            params.push(status.as_str().to_string());
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("(title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')");
            let pattern = like_pattern(search);
            params.push(pattern.clone());
            params.push(pattern);
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        // Get total count
        let count_sql = format!("SELECT COUNT(*) as count FROM tasks {}", where_clause);
        let mut count_query = sqlx::query(&count_sql).bind(user_id);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let count_row = count_query.fetch_one(&self.pool).await?;
        let total: i64 = count_row.get("count");

        // Get tasks
        let sql = format!(
            r#"
            SELECT id, user_id, title, description, status, created_at, updated_at
            FROM tasks
            {}
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        let mut tasks_query = sqlx::query(&sql).bind(user_id);
        for param in &params {
            tasks_query = tasks_query.bind(param);
        }
        tasks_query = tasks_query.bind(query.limit).bind(query.offset());

        let rows = tasks_query.fetch_all(&self.pool).await?;
        let tasks: Result<Vec<Task>, _> = rows
            .iter()
            .map(|row| Task::try_from(row).map_err(DbError::from))
            .collect();

        Ok((tasks?, total))
    }

    /// Apply a partial update to a task owned by `user_id`
    ///
    /// Returns `None` if no such task exists for this user.
    pub async fn update_task(
        &self,
        id: i64,
        user_id: i64,
        update: UpdateTask,
    ) -> Result<Option<Task>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(update.title)
        .bind(update.description)
        .bind(update.status.map(|s| s.as_str()))
        .bind(format_timestamp(&now))
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id, user_id).await
    }

    /// Toggle completion: completed tasks reopen as pending, anything else completes
    pub async fn toggle_task_status(&self, id: i64, user_id: i64) -> Result<Option<Task>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = CASE WHEN status = ? THEN ? ELSE ? END,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(TaskStatus::Completed.as_str())
        .bind(TaskStatus::Pending.as_str())
        .bind(TaskStatus::Completed.as_str())
        .bind(format_timestamp(&now))
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id, user_id).await
    }

    /// Delete a task owned by `user_id`
    pub async fn delete_task(&self, id: i64, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
