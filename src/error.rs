//! Typed errors and their HTTP mapping.

use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{posts::validation::NO_SUCH_USER, users::validation::USERNAME_TAKEN};

/// Failures surfaced by the user and post stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// Field-level validation failures, `field -> [messages]`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, ApiError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid credentials")]
    Unauthenticated,
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("no such route")]
    NoRoute,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Maps a store failure for an endpoint whose missing-record text is `not_found`.
    pub fn from_store(err: StoreError, not_found: &'static str) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(not_found),
            StoreError::Duplicate("username") => {
                ApiError::Validation(ValidationErrors::single("username", USERNAME_TAKEN))
            }
            StoreError::MissingReference("user_id") => {
                ApiError::Validation(ValidationErrors::single("user_id", NO_SUCH_USER))
            }
            other => ApiError::Internal(other.into()),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub name: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct ValidationBody<'a> {
    pub errors: &'a ValidationErrors,
}

fn described(status: StatusCode, description: &str) -> Response {
    let body = ErrorBody {
        code: status.as_u16(),
        name: status.canonical_reason().unwrap_or("Error").to_string(),
        description: description.to_string(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated => {
                let mut res = described(StatusCode::UNAUTHORIZED, "Invalid credentials");
                res.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic realm=\"Authentication Required\""),
                );
                res
            }
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationBody { errors: &errors }),
            )
                .into_response(),
            ApiError::NotFound(what) => described(StatusCode::NOT_FOUND, what),
            ApiError::BadRequest(why) => described(StatusCode::BAD_REQUEST, &why),
            ApiError::NoRoute => described(
                StatusCode::NOT_FOUND,
                "The requested URL was not found on the server.",
            ),
            ApiError::MethodNotAllowed => described(
                StatusCode::METHOD_NOT_ALLOWED,
                "The method is not allowed for the requested URL.",
            ),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                described(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The server encountered an internal error and was unable to complete your request.",
                )
            }
        }
    }
}

/// Router fallback for unknown paths.
pub async fn no_route() -> ApiError {
    ApiError::NoRoute
}

/// Gives the router's bodiless 405 the JSON error shape, keeping `Allow`.
pub async fn method_not_allowed_json(res: Response) -> Response {
    if res.status() != StatusCode::METHOD_NOT_ALLOWED
        || res.headers().contains_key(header::CONTENT_TYPE)
    {
        return res;
    }
    let allow = res.headers().get(header::ALLOW).cloned();
    let mut json = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        json.headers_mut().insert(header::ALLOW, allow);
    }
    json
}
