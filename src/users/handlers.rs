use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{credentials::CredentialStore, extractors::AuthUser},
    error::ApiError,
    extractors::{EntityId, JsonBody},
    state::AppState,
    users::{
        dto::UserIdResponse,
        repo_types::{NewUser, User, UserChanges},
        validation::{validate_new_user, validate_user_update},
    },
};

const NOT_FOUND: &str = "User not found";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .users
        .all()
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;
    Ok(Json(users))
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    EntityId(id): EntityId,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .get(id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))
}

#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<UserIdResponse>), ApiError> {
    let input = validate_new_user(&body, state.users.as_ref()).await?;

    let creds = CredentialStore::from_ref(&state);
    let password_hash = creds.hash_password(&input.password)?;

    let user = state
        .users
        .insert(NewUser {
            username: input.username,
            email: input.email,
            password_hash,
        })
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(UserIdResponse { user_id: user.id })))
}

#[instrument(skip(state, _caller, body))]
pub async fn update_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    EntityId(id): EntityId,
    JsonBody(body): JsonBody,
) -> Result<Json<UserIdResponse>, ApiError> {
    let patch = validate_user_update(&body)?;

    let password_hash = match patch.password {
        Some(plain) => Some(CredentialStore::from_ref(&state).hash_password(&plain)?),
        None => None,
    };

    let user = state
        .users
        .update(
            id,
            UserChanges {
                email: patch.email,
                password_hash,
            },
        )
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;

    info!(user_id = user.id, "user updated");
    Ok(Json(UserIdResponse { user_id: user.id }))
}

#[instrument(skip(state, _caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    EntityId(id): EntityId,
) -> Result<Json<UserIdResponse>, ApiError> {
    let user = state
        .users
        .delete(id)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;

    info!(user_id = user.id, "user deleted");
    Ok(Json(UserIdResponse { user_id: user.id }))
}
