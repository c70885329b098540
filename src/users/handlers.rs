use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Router,
};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{
    dto::{CreateUserRequest, EmailQuery, UpdateUserRequest},
    repo::UserChanges,
    repo_types::{NewUser, PublicUser, User},
};
use crate::{
    auth::{password::hash_password, AdminUser, AuthUser},
    error::{is_foreign_key_violation, is_unique_violation, ApiError, ApiResult},
    response::ApiResponse,
    state::AppState,
    validation::{parse_id, JsonBody, Patch},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/getAll", get(get_all_users))
        .route("/getEmail", get(get_user_by_email))
        .route("/create", post(create_user))
        .route("/update/:id", patch(update_user))
        .route("/delete/:id", delete(delete_user))
}

#[instrument(skip(state))]
pub async fn get_all_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<ApiResponse<Vec<PublicUser>>> {
    let users = User::list(&state.db).await?;
    Ok(ApiResponse::ok(
        "Get all users successfully",
        users.into_iter().map(PublicUser::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    me: AuthUser,
    Query(query): Query<EmailQuery>,
) -> ApiResult<ApiResponse<PublicUser>> {
    query.validate()?;

    if !me.is_admin() && query.email != me.email {
        warn!(user_id = me.id, "lookup of another user's email");
        return Err(ApiError::forbidden("Forbidden"));
    }

    let user = User::find_by_email(&state.db, &query.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::ok(
        format!("Get user {} successfully", user.email),
        user.into(),
    ))
}

#[instrument(skip(state, req))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(me): AdminUser,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::bad_request("Email already registered"));
    }

    let new_user = NewUser {
        password_hash: hash_password(&req.password)?,
        role: req.role(),
        status: req.status(),
        name: req.name,
        email: req.email,
        activation_token: None,
        activation_expired_at: None,
    };

    let user = match User::create(&state.db, &new_user).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %new_user.email, "email registered concurrently");
            return Err(ApiError::bad_request("Email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, by = me.id, "user created");
    Ok(ApiResponse::created("User created successfully", user.into()))
}

#[instrument(skip(state, req))]
pub async fn update_user(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let id = parse_id(&id)?;
    req.validate()?;

    if !me.is_admin() && (id != me.id || req.touches_privileges()) {
        warn!(user_id = me.id, target = id, "user update not permitted");
        return Err(ApiError::forbidden("Forbidden"));
    }

    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let password_hash = match &req.password {
        Patch::Set(plain) => Patch::Set(hash_password(plain)?),
        _ => Patch::Undefined,
    };
    let changes = UserChanges {
        name: req.name,
        password_hash,
        role: req.role,
        status: req.status,
    };

    let user = User::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = id, by = me.id, "user updated");
    Ok(ApiResponse::ok("User updated successfully", user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(me): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let id = parse_id(&id)?;

    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let owned = User::count_transactions(&state.db, id).await?;
    if owned > 0 {
        warn!(user_id = id, owned, "refusing to delete user with transactions");
        return Err(ApiError::conflict(
            "User still has transactions and cannot be deleted",
        ));
    }

    let user = match User::delete(&state.db, id).await {
        Ok(Some(u)) => u,
        Ok(None) => return Err(ApiError::not_found("User not found")),
        Err(e) if is_foreign_key_violation(&e) => {
            warn!(user_id = id, "transaction added while deleting user");
            return Err(ApiError::conflict(
                "User still has transactions and cannot be deleted",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = id, by = me.id, "user deleted");
    Ok(ApiResponse::ok("User deleted successfully", user.into()))
}
