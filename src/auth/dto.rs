use serde::Serialize;

/// Response of `GET /token` and `GET /login`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
