use anyhow::Context;
use sqlx::{PgExecutor, PgPool};

use super::repo_types::{NewUser, Role, User, UserStatus};
use crate::db::UpdateBuilder;
use crate::validation::Patch;

const USER_COLUMNS: &str = "id, name, email, password, role, status, activation_token, \
                            activation_expired_at, created_at, updated_at";

/// Partial update of a user row.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Patch<String>,
    pub password_hash: Patch<String>,
    pub role: Patch<Role>,
    pub status: Patch<UserStatus>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i32) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    pub async fn find_by_activation_token(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE activation_token = $1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await
        .context("find user by activation token")?;
        Ok(user)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(db)
        .await
        .context("list users")?;
        Ok(users)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await
            .context("count users")?;
        Ok(n)
    }

    /// Insert a new user. Fails with a unique violation if the email is taken.
    pub async fn create<'e, E>(executor: E, new: &NewUser) -> anyhow::Result<User>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password, role, status, activation_token, activation_expired_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.status)
        .bind(&new.activation_token)
        .bind(new.activation_expired_at)
        .fetch_one(executor)
        .await
        .context("insert user")?;
        Ok(user)
    }

    /// Marks the account active and consumes its activation token.
    ///
    /// Returns `false` if the token was already consumed by someone else.
    pub async fn activate(db: &PgPool, id: i32, token: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET status = 'ACTIVE',
                   activation_token = NULL,
                   activation_expired_at = NULL,
                   updated_at = now()
             WHERE id = $1 AND activation_token = $2
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(db)
        .await
        .context("activate user")?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn update(db: &PgPool, id: i32, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let mut update = UpdateBuilder::new("users");
        update
            .set("name", changes.name)
            .set("password", changes.password_hash)
            .set("role", changes.role)
            .set("status", changes.status);
        let user = update
            .finish_owned(id, None, USER_COLUMNS)
            .build_query_as::<User>()
            .fetch_optional(db)
            .await
            .context("update user")?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: i32) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("delete user")?;
        Ok(user)
    }

    pub async fn count_transactions(db: &PgPool, id: i32) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE created_by_id = $1")
            .bind(id)
            .fetch_one(db)
            .await
            .context("count user transactions")?;
        Ok(n)
    }
}
