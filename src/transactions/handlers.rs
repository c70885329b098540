use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use validator::Validate;

use super::{
    dto::{CreateTransactionRequest, UpdateTransactionRequest},
    repo,
    repo_types::{NewTransaction, Transaction},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    response::ApiResponse,
    state::AppState,
    validation::{parse_id, JsonBody},
};

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/getAll", get(get_all_transactions))
        .route("/get/:id", get(get_transaction))
        .route("/create", post(create_transaction))
        .route("/update/:id", patch(update_transaction))
        .route("/delete/:id", delete(delete_transaction))
}

#[instrument(skip(state))]
pub async fn get_all_transactions(
    State(state): State<AppState>,
    me: AuthUser,
) -> ApiResult<ApiResponse<Vec<Transaction>>> {
    let rows = repo::list_by_owner(&state.db, me.id).await?;
    Ok(ApiResponse::ok("Get all transactions successfully", rows))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Transaction>> {
    let id = parse_id(&id)?;
    let row = repo::find_owned(&state.db, id, me.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
    Ok(ApiResponse::ok("Get transaction successfully", row))
}

#[instrument(skip(state, req))]
pub async fn create_transaction(
    State(state): State<AppState>,
    me: AuthUser,
    JsonBody(req): JsonBody<CreateTransactionRequest>,
) -> ApiResult<ApiResponse<Transaction>> {
    req.validate()?;

    let row = repo::create(
        &state.db,
        &NewTransaction {
            name_transaction: req.name_transaction,
            price: req.price,
            type_transaction: req.type_transaction,
            transaction_date: req
                .transaction_date
                .map_or_else(OffsetDateTime::now_utc, |d| d.0),
            image: req.image,
            created_by_id: me.id,
        },
    )
    .await?;

    info!(transaction_id = row.id, user_id = me.id, "transaction created");
    Ok(ApiResponse::created("Transaction created successfully", row))
}

#[instrument(skip(state, req))]
pub async fn update_transaction(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTransactionRequest>,
) -> ApiResult<ApiResponse<Transaction>> {
    let id = parse_id(&id)?;
    req.validate()?;

    if repo::find_owned(&state.db, id, me.id).await?.is_none() {
        return Err(ApiError::not_found("Transaction not found"));
    }

    let row = repo::update(&state.db, id, me.id, req.into())
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    info!(transaction_id = id, user_id = me.id, "transaction updated");
    Ok(ApiResponse::ok("Transaction updated successfully", row))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Transaction>> {
    let id = parse_id(&id)?;
    let row = repo::delete(&state.db, id, me.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    info!(transaction_id = id, user_id = me.id, "transaction deleted");
    Ok(ApiResponse::ok("Transaction deleted successfully", row))
}
