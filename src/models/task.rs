use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the urgency of a task.
/// Corresponds to the `task_urgency` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_urgency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskUrgency {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is done.
    Completed,
    /// Task slipped past its deadline.
    Delayed,
}

/// Input structure for creating or updating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The name of the task. Must be between 1 and 255 characters.
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// The day the task is due, as `YYYY-MM-DD`.
    pub deadline: NaiveDate,

    /// Defaults to `pending` when omitted.
    #[serde(default)]
    pub status: Option<TaskStatus>,

    /// Defaults to `medium` when omitted.
    #[serde(default)]
    pub urgency: Option<TaskUrgency>,

    /// Who the task is assigned to.
    #[validate(length(min = 1, max = 50))]
    pub assignee: String,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub deadline: NaiveDate,
    pub status: TaskStatus,
    pub urgency: TaskUrgency,
    pub assignee: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for filtering the task list.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub urgency: Option<TaskUrgency>,
    pub assignee: Option<String>,
    /// Case-insensitive search on the task name.
    pub search: Option<String>,
}

impl TaskInput {
    pub fn status_or_default(&self) -> TaskStatus {
        self.status.unwrap_or_default()
    }

    pub fn urgency_or_default(&self) -> TaskUrgency {
        self.urgency.unwrap_or_default()
    }
}
