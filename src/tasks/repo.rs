use anyhow::Context;
use sqlx::PgPool;

use super::repo_types::{NewTask, Task, TaskChanges};
use crate::db::UpdateBuilder;

const TASK_COLUMNS: &str = "id, name_task, image, start_task, finish_task, status_task, \
                            created_by_id, created_at, updated_at";

pub async fn list_by_owner(db: &PgPool, owner_id: i32) -> anyhow::Result<Vec<Task>> {
    let rows = sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {TASK_COLUMNS}
        FROM tasks
        WHERE created_by_id = $1
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("list tasks")?;
    Ok(rows)
}

pub async fn find_owned(db: &PgPool, id: i32, owner_id: i32) -> anyhow::Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND created_by_id = $2"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await
    .context("find task")?;
    Ok(task)
}

pub async fn count_by_owner(db: &PgPool, owner_id: i32) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE created_by_id = $1")
        .bind(owner_id)
        .fetch_one(db)
        .await
        .context("count tasks")?;
    Ok(n)
}

pub async fn create(db: &PgPool, new: &NewTask) -> anyhow::Result<Task> {
    let task = sqlx::query_as::<_, Task>(&format!(
        r#"
        INSERT INTO tasks (name_task, image, start_task, finish_task, status_task, created_by_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(&new.name_task)
    .bind(&new.image)
    .bind(new.start_task)
    .bind(new.finish_task)
    .bind(new.status_task)
    .bind(new.created_by_id)
    .fetch_one(db)
    .await
    .context("insert task")?;
    Ok(task)
}

pub async fn update(
    db: &PgPool,
    id: i32,
    owner_id: i32,
    changes: TaskChanges,
) -> anyhow::Result<Option<Task>> {
    let mut update = UpdateBuilder::new("tasks");
    update
        .set("name_task", changes.name_task)
        .set("image", changes.image)
        .set("start_task", changes.start_task)
        .set("finish_task", changes.finish_task)
        .set("status_task", changes.status_task);
    let task = update
        .finish_owned(id, Some(owner_id), TASK_COLUMNS)
        .build_query_as::<Task>()
        .fetch_optional(db)
        .await
        .context("update task")?;
    Ok(task)
}

pub async fn delete(db: &PgPool, id: i32, owner_id: i32) -> anyhow::Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "DELETE FROM tasks WHERE id = $1 AND created_by_id = $2 RETURNING {TASK_COLUMNS}"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await
    .context("delete task")?;
    Ok(task)
}
