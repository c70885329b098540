use crate::state::AppState;
use axum::Router;

pub mod activation;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use extractors::{require_auth, AdminUser, AuthUser};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
