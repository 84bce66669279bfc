use serde::Serialize;

/// Body of every successful post mutation.
#[derive(Debug, Serialize)]
pub struct PostIdResponse {
    pub post_id: i64,
}
