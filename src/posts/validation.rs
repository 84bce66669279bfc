use crate::{
    error::{ApiError, ValidationErrors},
    posts::repo_types::{NewPost, PostChanges},
    users::repo::UserStore,
    validation::{optional_string, reject_unknown, required_id, required_string, Body},
};

pub const NO_SUCH_USER: &str = "User does not exist";

/// Validates a creation payload; `user_id` must name an existing user.
pub async fn validate_new_post(body: &Body, users: &dyn UserStore) -> Result<NewPost, ApiError> {
    let mut errors = ValidationErrors::new();
    reject_unknown(body, &["title", "body", "user_id"], &mut errors);

    let title = required_string(body, "title", &mut errors);
    let text = required_string(body, "body", &mut errors);
    let mut user_id = required_id(body, "user_id", &mut errors);

    if let Some(id) = user_id {
        let known = users
            .exists(id)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        if !known {
            errors.add("user_id", NO_SUCH_USER);
            user_id = None;
        }
    }

    match (title, text, user_id) {
        (Some(title), Some(body), Some(user_id)) if errors.is_empty() => Ok(NewPost {
            title,
            body,
            user_id,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

/// Partial update of `title` and/or `body`. Ownership cannot be reassigned.
pub fn validate_post_update(body: &Body) -> Result<PostChanges, ApiError> {
    let mut errors = ValidationErrors::new();
    reject_unknown(body, &["title", "body"], &mut errors);

    let changes = PostChanges {
        title: optional_string(body, "title", &mut errors),
        body: optional_string(body, "body", &mut errors),
    };
    errors.into_result(changes)
}
