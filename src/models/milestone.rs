use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct MilestoneInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// `YYYY-MM-DD`.
    pub date: NaiveDate,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Milestone {
    pub id: i32,
    pub title: String,
    pub date: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
