use crate::{
    error::{ApiError, ValidationErrors},
    users::repo::UserStore,
    validation::{
        is_valid_email, normalize, optional_string, reject_unknown, required_string, Body, BLANK,
    },
};

pub const USERNAME_TAKEN: &str = "That username is taken";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const PASSWORD_TOO_SHORT: &str = "Password must contain at least 8 characters";
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Normalized input for a new user; the password is still plain text.
#[derive(Debug)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn check_email(raw: String, errors: &mut ValidationErrors) -> Option<String> {
    let email = normalize(&raw);
    if is_valid_email(&email) {
        Some(email)
    } else {
        errors.add("email", INVALID_EMAIL);
        None
    }
}

fn check_password(raw: String, errors: &mut ValidationErrors) -> Option<String> {
    if raw.chars().count() >= MIN_PASSWORD_CHARS {
        Some(raw)
    } else {
        errors.add("password", PASSWORD_TOO_SHORT);
        None
    }
}

/// Validates a creation payload, including username uniqueness against `users`.
pub async fn validate_new_user(body: &Body, users: &dyn UserStore) -> Result<UserInput, ApiError> {
    let mut errors = ValidationErrors::new();
    reject_unknown(body, &["username", "email", "password"], &mut errors);

    let mut username = required_string(body, "username", &mut errors).map(|raw| normalize(&raw));
    if username.as_deref() == Some("") {
        errors.add("username", BLANK);
        username = None;
    }
    if let Some(name) = username.as_deref() {
        let existing = users
            .find_by_username(name)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        if existing.is_some() {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    let email =
        required_string(body, "email", &mut errors).and_then(|raw| check_email(raw, &mut errors));
    let password = required_string(body, "password", &mut errors)
        .and_then(|raw| check_password(raw, &mut errors));

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(UserInput {
            username,
            email,
            password,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

/// Validates a partial update. `username` is immutable and reported as unknown.
pub fn validate_user_update(body: &Body) -> Result<UserPatch, ApiError> {
    let mut errors = ValidationErrors::new();
    reject_unknown(body, &["email", "password"], &mut errors);

    let patch = UserPatch {
        email: optional_string(body, "email", &mut errors)
            .and_then(|raw| check_email(raw, &mut errors)),
        password: optional_string(body, "password", &mut errors)
            .and_then(|raw| check_password(raw, &mut errors)),
    };
    errors.into_result(patch)
}
