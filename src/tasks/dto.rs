use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::repo_types::{TaskChanges, TaskStatus};
use crate::validation::{not_null, patch_min_chars, ApiDate, Patch};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name task is required"))]
    pub name_task: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Defaults to the time of creation.
    #[serde(default)]
    pub start_task: Option<ApiDate>,
    #[serde(default)]
    pub finish_task: Option<ApiDate>,
    pub status_task: TaskStatus,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    #[validate(custom(function = "name_task_patch"))]
    pub name_task: Patch<String>,
    #[serde(default)]
    pub image: Patch<String>,
    #[serde(default)]
    #[validate(custom(function = "not_null"))]
    pub start_task: Patch<ApiDate>,
    #[serde(default)]
    #[validate(custom(function = "not_null"))]
    pub finish_task: Patch<ApiDate>,
    #[serde(default)]
    #[validate(custom(function = "not_null"))]
    pub status_task: Patch<TaskStatus>,
}

fn name_task_patch(value: &Patch<String>) -> Result<(), ValidationError> {
    patch_min_chars(value, 1, "Name task is required")
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(r: UpdateTaskRequest) -> Self {
        Self {
            name_task: r.name_task,
            image: r.image,
            start_task: r.start_task.map(|d| d.0),
            finish_task: r.finish_task.map(|d| d.0),
            status_task: r.status_task,
        }
    }
}
