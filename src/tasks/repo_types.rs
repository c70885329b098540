use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::validation::Patch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Progress,
    Done,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub name_task: String,
    pub image: Option<String>, // data URI or path
    #[serde(with = "time::serde::rfc3339")]
    pub start_task: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub finish_task: OffsetDateTime,
    pub status_task: TaskStatus,
    pub created_by_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name_task: String,
    pub image: Option<String>,
    pub start_task: OffsetDateTime,
    pub finish_task: OffsetDateTime,
    pub status_task: TaskStatus,
    pub created_by_id: i32,
}

#[derive(Debug, Default)]
pub struct TaskChanges {
    pub name_task: Patch<String>,
    pub image: Patch<String>,
    pub start_task: Patch<OffsetDateTime>,
    pub finish_task: Patch<OffsetDateTime>,
    pub status_task: Patch<TaskStatus>,
}
