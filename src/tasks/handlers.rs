use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use validator::Validate;

use super::{
    dto::{CreateTaskRequest, UpdateTaskRequest},
    repo,
    repo_types::{NewTask, Task},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    response::ApiResponse,
    state::AppState,
    validation::{parse_id, JsonBody},
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/getAll", get(get_all_tasks))
        .route("/get/:id", get(get_task))
        .route("/create", post(create_task))
        .route("/update/:id", patch(update_task))
        .route("/delete/:id", delete(delete_task))
}

#[instrument(skip(state))]
pub async fn get_all_tasks(
    State(state): State<AppState>,
    me: AuthUser,
) -> ApiResult<ApiResponse<Vec<Task>>> {
    let tasks = repo::list_by_owner(&state.db, me.id).await?;
    Ok(ApiResponse::ok("Get all tasks successfully", tasks))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Task>> {
    let id = parse_id(&id)?;
    let task = repo::find_owned(&state.db, id, me.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    Ok(ApiResponse::ok("Get task successfully", task))
}

#[instrument(skip(state, req))]
pub async fn create_task(
    State(state): State<AppState>,
    me: AuthUser,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> ApiResult<ApiResponse<Task>> {
    req.validate()?;
    let now = OffsetDateTime::now_utc();

    let task = repo::create(
        &state.db,
        &NewTask {
            name_task: req.name_task,
            image: req.image,
            start_task: req.start_task.map_or(now, |d| d.0),
            finish_task: req.finish_task.map_or(now, |d| d.0),
            status_task: req.status_task,
            created_by_id: me.id,
        },
    )
    .await?;

    info!(task_id = task.id, user_id = me.id, "task created");
    Ok(ApiResponse::created("Task created successfully", task))
}

#[instrument(skip(state, req))]
pub async fn update_task(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTaskRequest>,
) -> ApiResult<ApiResponse<Task>> {
    let id = parse_id(&id)?;
    req.validate()?;

    if repo::find_owned(&state.db, id, me.id).await?.is_none() {
        return Err(ApiError::not_found("Task not found"));
    }

    let task = repo::update(&state.db, id, me.id, req.into())
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    info!(task_id = id, user_id = me.id, "task updated");
    Ok(ApiResponse::ok("Task updated successfully", task))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Task>> {
    let id = parse_id(&id)?;
    let task = repo::delete(&state.db, id, me.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    info!(task_id = id, user_id = me.id, "task deleted");
    Ok(ApiResponse::ok("Task deleted successfully", task))
}
