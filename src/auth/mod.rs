use crate::state::AppState;
use axum::Router;

pub mod credentials;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;

pub fn router() -> Router<AppState> {
    handlers::token_routes()
}
