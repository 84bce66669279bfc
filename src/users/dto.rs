use serde::Serialize;

/// Body of every successful user mutation.
#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub user_id: i64,
}
