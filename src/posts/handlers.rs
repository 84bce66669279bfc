use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    extractors::{EntityId, JsonBody},
    posts::{
        dto::PostIdResponse,
        repo_types::Post,
        validation::{validate_new_post, validate_post_update},
    },
    state::AppState,
};

const NOT_FOUND: &str = "Post not found";

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
}

#[instrument(skip_all)]
pub async fn list_posts(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state
        .posts
        .all()
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;
    Ok(Json(posts))
}

#[instrument(skip(state, _caller))]
pub async fn get_post(
    State(state): State<AppState>,
    _caller: AuthUser,
    EntityId(id): EntityId,
) -> Result<Json<Post>, ApiError> {
    state
        .posts
        .get(id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))
}

#[instrument(skip_all)]
pub async fn create_post(
    State(state): State<AppState>,
    _caller: AuthUser,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<PostIdResponse>), ApiError> {
    let new_post = validate_new_post(&body, state.users.as_ref()).await?;

    // The owner can vanish between validation and insert; the foreign key
    // turns that into the same user_id error.
    let post = state
        .posts
        .insert(new_post)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;

    info!(post_id = post.id, user_id = post.user_id, "post created");
    Ok((StatusCode::CREATED, Json(PostIdResponse { post_id: post.id })))
}

#[instrument(skip(state, _caller, body))]
pub async fn update_post(
    State(state): State<AppState>,
    _caller: AuthUser,
    EntityId(id): EntityId,
    JsonBody(body): JsonBody,
) -> Result<Json<PostIdResponse>, ApiError> {
    let changes = validate_post_update(&body)?;
    let post = state
        .posts
        .update(id, changes)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;

    info!(post_id = post.id, "post updated");
    Ok(Json(PostIdResponse { post_id: post.id }))
}

#[instrument(skip(state, _caller))]
pub async fn delete_post(
    State(state): State<AppState>,
    _caller: AuthUser,
    EntityId(id): EntityId,
) -> Result<Json<PostIdResponse>, ApiError> {
    let post = state
        .posts
        .delete(id)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND))?;

    info!(post_id = post.id, "post deleted");
    Ok(Json(PostIdResponse { post_id: post.id }))
}
