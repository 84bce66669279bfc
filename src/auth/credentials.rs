use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use tracing::debug;

use crate::{
    auth::{jwt::JwtKeys, password},
    error::StoreError,
    state::AppState,
    users::{repo::UserStore, repo_types::User},
    validation::normalize,
};

lazy_static! {
    /// Verified against when the username is unknown.
    static ref DUMMY_HASH: Option<String> =
        password::hash_password("not-a-real-password").ok();
}

/// Password hashing plus token issue/verification, bound to the user store
/// so verified credentials resolve to a live user.
#[derive(Clone)]
pub struct CredentialStore {
    keys: JwtKeys,
    users: Arc<dyn UserStore>,
    token_ttl: i64,
}

impl FromRef<AppState> for CredentialStore {
    fn from_ref(state: &AppState) -> Self {
        Self {
            keys: JwtKeys::from_ref(state),
            users: state.users.clone(),
            token_ttl: state.config.jwt.ttl_seconds,
        }
    }
}

impl CredentialStore {
    pub fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        password::hash_password(plain)
    }

    pub fn verify_password(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        password::verify_password(plain, hash)
    }

    pub fn token_ttl(&self) -> i64 {
        self.token_ttl
    }

    pub fn issue_token(&self, user_id: i64, ttl_seconds: i64) -> anyhow::Result<String> {
        self.keys.issue(user_id, ttl_seconds)
    }

    /// Username/password check. `Ok(None)` for unknown users and wrong passwords alike.
    pub async fn verify_basic(
        &self,
        username: &str,
        plain: &str,
    ) -> anyhow::Result<Option<User>> {
        let Some(user) = self.users.find_by_username(&normalize(username)).await? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                self.verify_password(plain, dummy)?;
            }
            return Ok(None);
        };
        if self.verify_password(plain, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Resolves a token to its user. Malformed, expired, foreign and orphaned
    /// tokens all yield `Ok(None)`; only store failures are errors.
    pub async fn verify_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let claims = match self.keys.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "token rejected");
                return Ok(None);
            }
        };
        match self.users.get(claims.sub).await {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::NotFound) => {
                debug!(user_id = claims.sub, "token for deleted user");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
