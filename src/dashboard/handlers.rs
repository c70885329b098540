use axum::{extract::State, routing::get, Router};
use time::OffsetDateTime;
use tracing::{debug, instrument};

use super::services::{summarize, year_bounds, DashboardSummary};
use crate::{
    auth::AuthUser, error::ApiResult, response::ApiResponse, state::AppState, tasks,
    transactions, users::User,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/summary", get(get_summary))
}

#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    me: AuthUser,
) -> ApiResult<ApiResponse<DashboardSummary>> {
    let now = OffsetDateTime::now_utc();
    let (from, until) = year_bounds(now)?;

    let (total_users, total_tasks, points) = tokio::try_join!(
        User::count(&state.db),
        tasks::repo::count_by_owner(&state.db, me.id),
        transactions::repo::list_points_between(&state.db, me.id, from, until),
    )?;

    debug!(user_id = me.id, transactions = points.len(), "building dashboard summary");
    Ok(ApiResponse::ok(
        "Dashboard summary fetched successfully",
        summarize(&points, now, total_users, total_tasks),
    ))
}
