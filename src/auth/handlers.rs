use axum::{extract::{FromRef, State}, routing::get, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::{credentials::CredentialStore, dto::TokenResponse, extractors::AuthUser},
    error::ApiError,
    state::AppState,
};

pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/token", get(get_token))
        .route("/login", get(get_token))
}

/// Issues a fresh token for whoever authenticated, by either scheme.
#[instrument(skip_all, fields(user_id = caller.id))]
pub async fn get_token(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<TokenResponse>, ApiError> {
    let creds = CredentialStore::from_ref(&state);
    let token = creds.issue_token(caller.id, creds.token_ttl())?;
    info!("token issued");
    Ok(Json(TokenResponse { token }))
}
