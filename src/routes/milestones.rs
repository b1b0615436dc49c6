use crate::{
    error::AppError,
    models::{Milestone, MilestoneInput},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

const MILESTONE_COLUMNS: &str = "id, title, date, description, created_at, updated_at";

/// Lists milestones in calendar order.
#[get("")]
pub async fn get_milestones(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let milestones = sqlx::query_as::<_, Milestone>(&format!(
        "SELECT {} FROM milestones ORDER BY date ASC",
        MILESTONE_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(milestones))
}

#[post("")]
pub async fn create_milestone(
    pool: web::Data<PgPool>,
    milestone_data: web::Json<MilestoneInput>,
) -> Result<impl Responder, AppError> {
    milestone_data.validate()?;

    let milestone = sqlx::query_as::<_, Milestone>(&format!(
        "INSERT INTO milestones (title, date, description) VALUES ($1, $2, $3) RETURNING {}",
        MILESTONE_COLUMNS
    ))
    .bind(&milestone_data.title)
    .bind(milestone_data.date)
    .bind(&milestone_data.description)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(milestone))
}

#[get("/{id}")]
pub async fn get_milestone(
    pool: web::Data<PgPool>,
    milestone_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let milestone = sqlx::query_as::<_, Milestone>(&format!(
        "SELECT {} FROM milestones WHERE id = $1",
        MILESTONE_COLUMNS
    ))
    .bind(milestone_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    milestone
        .map(|m| HttpResponse::Ok().json(m))
        .ok_or_else(|| AppError::NotFound("Milestone not found".into()))
}

#[put("/{id}")]
pub async fn update_milestone(
    pool: web::Data<PgPool>,
    milestone_id: web::Path<i32>,
    milestone_data: web::Json<MilestoneInput>,
) -> Result<impl Responder, AppError> {
    milestone_data.validate()?;

    let milestone = sqlx::query_as::<_, Milestone>(&format!(
        "UPDATE milestones SET title = $1, date = $2, description = $3, updated_at = NOW()
         WHERE id = $4
         RETURNING {}",
        MILESTONE_COLUMNS
    ))
    .bind(&milestone_data.title)
    .bind(milestone_data.date)
    .bind(&milestone_data.description)
    .bind(milestone_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    milestone
        .map(|m| HttpResponse::Ok().json(m))
        .ok_or_else(|| AppError::NotFound("Milestone not found".into()))
}

#[delete("/{id}")]
pub async fn delete_milestone(
    pool: web::Data<PgPool>,
    milestone_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM milestones WHERE id = $1")
        .bind(milestone_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Milestone not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Milestone deleted" })))
}
