use crate::{
    error::AppError,
    models::{Task, TaskInput, TaskQuery},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, name, deadline, status, urgency, assignee, created_at, updated_at";

/// Lists tasks, newest first.
///
/// ## Query Parameters:
/// - `status` (optional): `pending`, `in_progress`, `completed` or `delayed`.
/// - `urgency` (optional): `low`, `medium`, `high` or `urgent`.
/// - `assignee` (optional): exact assignee match.
/// - `search` (optional): case-insensitive match on the task name.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let (sql, search_pattern) = build_list_query(&query_params);

    let mut query_builder = sqlx::query_as::<_, Task>(&sql);
    if let Some(status) = query_params.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(urgency) = query_params.urgency {
        query_builder = query_builder.bind(urgency);
    }
    if let Some(assignee) = &query_params.assignee {
        query_builder = query_builder.bind(assignee);
    }
    if let Some(pattern) = search_pattern {
        query_builder = query_builder.bind(pattern);
    }

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Builds the list statement with one positional placeholder per filter that is set.
/// Returns the SQL and the `ILIKE` pattern for `search`, if any.
fn build_list_query(query: &TaskQuery) -> (String, Option<String>) {
    let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
    let mut conditions: Vec<String> = Vec::new();
    let mut param_count = 1;

    if query.status.is_some() {
        conditions.push(format!("status = ${}", param_count));
        param_count += 1;
    }
    if query.urgency.is_some() {
        conditions.push(format!("urgency = ${}", param_count));
        param_count += 1;
    }
    if query.assignee.is_some() {
        conditions.push(format!("assignee = ${}", param_count));
        param_count += 1;
    }
    let search_pattern = query.search.as_ref().map(|search| {
        conditions.push(format!("name ILIKE ${}", param_count));
        format!("%{}%", search)
    });

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");

    (sql, search_pattern)
}

/// Creates a task.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: malformed JSON or date.
/// - `422 Unprocessable Entity`: validation failure.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (name, deadline, status, urgency, assignee)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&task_data.name)
    .bind(task_data.deadline)
    .bind(task_data.status_or_default())
    .bind(task_data.urgency_or_default())
    .bind(&task_data.assignee)
    .fetch_one(&**pool)
    .await?;

    log::debug!("created task {}", task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a task by id.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1",
        TASK_COLUMNS
    ))
    .bind(task_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Replaces a task's fields.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET name = $1, deadline = $2, status = $3, urgency = $4, assignee = $5, updated_at = NOW()
         WHERE id = $6
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&task_data.name)
    .bind(task_data.deadline)
    .bind(task_data.status_or_default())
    .bind(task_data.urgency_or_default())
    .bind(&task_data.assignee)
    .bind(task_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes a task.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted" })))
}
