use anyhow::Context;
use axum::{
    extract::{FromRef, Path, State},
    response::Html,
    routing::{get, post},
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{
        activation::{activation_link, is_expired, is_well_formed, issue_activation_token},
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisteredUser},
        jwt::{SessionKeys, SessionPayload},
        password::{burn_verification, hash_password, verify_password},
    },
    error::{is_unique_violation, ApiError, ApiResult},
    mailer::activation_message,
    response::ApiResponse,
    state::AppState,
    users::{NewUser, Role, User, UserStatus},
    validation::JsonBody,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/activate/:token", get(activate))
}

#[instrument(skip(state, req))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<ApiResponse<RegisteredUser>> {
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = hash_password(&req.password)?;
    let activation = issue_activation_token(OffsetDateTime::now_utc());

    let new_user = NewUser {
        name: req.name,
        email: req.email,
        password_hash,
        role: Role::User,
        status: UserStatus::Nonactive,
        activation_token: Some(activation.token.clone()),
        activation_expired_at: Some(activation.expires_at),
    };

    // The row only becomes visible once the activation mail went out.
    let mut tx = state.db.begin().await.context("begin tx")?;
    let user = match User::create(&mut *tx, &new_user).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %new_user.email, "email registered concurrently");
            return Err(ApiError::bad_request("Email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    let link = activation_link(&state.config.base_url, &activation.token);
    state
        .mailer
        .send(&activation_message(&user.email, &user.name, &link))
        .await
        .context("send activation mail")?;
    tx.commit().await.context("commit tx")?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(ApiResponse::created(
        "Register success, please check your email to activate your account",
        RegisteredUser {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    ))
}

#[instrument(skip(state, req))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    req.validate()?;

    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(u) => u,
        None => {
            burn_verification(&req.password);
            warn!(email = %req.email, "login unknown email");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    if user.status != UserStatus::Active {
        warn!(user_id = user.id, "login on inactive account");
        return Err(ApiError::forbidden(
            "Account is not active, please activate it from your email",
        ));
    }

    if !verify_password(&req.password, &user.password)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = SessionKeys::from_ref(&state).sign(&SessionPayload {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    })?;

    info!(user_id = user.id, "user logged in");
    Ok(ApiResponse::ok(
        "Login success",
        LoginResponse {
            token,
            id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
        },
    ))
}

#[instrument(skip(state, token))]
pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Html<String>> {
    if !is_well_formed(&token) {
        warn!("malformed activation token");
        return Err(ApiError::bad_request("Invalid activation token"));
    }

    let user = match User::find_by_activation_token(&state.db, &token).await? {
        Some(u) => u,
        None => {
            warn!("unknown activation token");
            return Err(ApiError::bad_request("Invalid activation token"));
        }
    };

    if is_expired(user.activation_expired_at, OffsetDateTime::now_utc()) {
        warn!(user_id = user.id, "expired activation token");
        return Err(ApiError::bad_request("Activation token has expired"));
    }

    if !User::activate(&state.db, user.id, &token).await? {
        warn!(user_id = user.id, "activation token consumed concurrently");
        return Err(ApiError::bad_request("Invalid activation token"));
    }

    info!(user_id = user.id, "account activated");
    Ok(Html(activated_page(&user.name)))
}

fn activated_page(name: &str) -> String {
    let name: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '&' | '"' | '\''))
        .collect();
    format!(
        "<!DOCTYPE html>\
         <html><head><meta charset=\"utf-8\"><title>CashIn</title></head>\
         <body><h1>Account activated</h1>\
         <p>Hi {name}, your account is now active. You can close this page and log in.</p>\
         </body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activated_page_strips_markup() {
        let page = activated_page("<script>x</script>");
        assert!(!page.contains("<script>"));
        assert!(page.contains("Account activated"));
    }
}
