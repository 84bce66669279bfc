use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use base64ct::{Base64, Encoding};
use tracing::warn;

use crate::{
    auth::credentials::CredentialStore, error::ApiError, state::AppState,
    users::repo_types::User,
};

/// One way of turning an `Authorization` header into a user.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// `Ok(None)` when the header is for another scheme or the credentials are rejected.
    async fn authenticate(
        &self,
        header: &str,
        creds: &CredentialStore,
    ) -> anyhow::Result<Option<User>>;
}

/// Returns the parameter of `header` if it uses `scheme` (case-insensitive).
fn scheme_param<'h>(header: &'h str, scheme: &str) -> Option<&'h str> {
    let (name, param) = header.trim().split_once(' ')?;
    name.eq_ignore_ascii_case(scheme).then(|| param.trim())
}

/// `Authorization: Basic base64(username:password)`
pub struct BasicAuth;

#[async_trait]
impl AuthStrategy for BasicAuth {
    async fn authenticate(
        &self,
        header: &str,
        creds: &CredentialStore,
    ) -> anyhow::Result<Option<User>> {
        let Some(encoded) = scheme_param(header, "Basic") else {
            return Ok(None);
        };
        let Ok(decoded) = Base64::decode_vec(encoded) else {
            return Ok(None);
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return Ok(None);
        };
        let Some((username, password)) = decoded.split_once(':') else {
            return Ok(None);
        };
        creds.verify_basic(username, password).await
    }
}

/// `Authorization: Bearer <token>`
pub struct TokenAuth;

#[async_trait]
impl AuthStrategy for TokenAuth {
    async fn authenticate(
        &self,
        header: &str,
        creds: &CredentialStore,
    ) -> anyhow::Result<Option<User>> {
        match scheme_param(header, "Bearer") {
            Some(token) if !token.is_empty() => creds.verify_token(token).await,
            _ => Ok(None),
        }
    }
}

/// Ordered strategies; the first one yielding a user wins.
pub struct AuthChain {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl Default for AuthChain {
    fn default() -> Self {
        Self::new(vec![Box::new(BasicAuth), Box::new(TokenAuth)])
    }
}

impl AuthChain {
    pub fn new(strategies: Vec<Box<dyn AuthStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        creds: &CredentialStore,
    ) -> Result<User, ApiError> {
        let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) else {
            warn!("missing or unreadable Authorization header");
            return Err(ApiError::Unauthenticated);
        };

        for strategy in &self.strategies {
            if let Some(user) = strategy.authenticate(header, creds).await? {
                return Ok(user);
            }
        }

        warn!("authentication failed");
        Err(ApiError::Unauthenticated)
    }
}

/// The authenticated caller. Runs the application's [`AuthChain`].
#[derive(Debug)]
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let creds = CredentialStore::from_ref(state);
        state.auth.authenticate(&parts.headers, &creds).await.map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{basic, bearer, seed_user, test_state};
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn scheme_matching_is_case_insensitive() {
        assert_eq!(scheme_param("Bearer abc", "Bearer"), Some("abc"));
        assert_eq!(scheme_param("bearer abc", "Bearer"), Some("abc"));
        assert_eq!(scheme_param("Basic abc", "Bearer"), None);
        assert_eq!(scheme_param("Bearer", "Bearer"), None);
    }

    #[tokio::test]
    async fn either_scheme_authenticates() {
        let state = test_state();
        let carol = seed_user(&state, "carol", "carol-password").await;
        let creds = CredentialStore::from_ref(&state);
        let chain = AuthChain::default();

        let via_basic = chain
            .authenticate(&headers(&basic("carol", "carol-password")), &creds)
            .await
            .unwrap();
        assert_eq!(via_basic.id, carol.id);

        let token = creds.issue_token(carol.id, 600).unwrap();
        let via_token = chain.authenticate(&headers(&bearer(&token)), &creds).await.unwrap();
        assert_eq!(via_token.id, carol.id);
    }

    #[tokio::test]
    async fn every_failure_is_the_same_error() {
        let state = test_state();
        seed_user(&state, "dave", "dave-password").await;
        let creds = CredentialStore::from_ref(&state);
        let chain = AuthChain::default();

        let attempts = [
            basic("dave", "not-it"),
            basic("eve", "dave-password"),
            "Basic !!!not-base64!!!".to_string(),
            bearer("forged.token.value"),
            "Digest whatever".to_string(),
        ];
        for value in attempts {
            let err = chain.authenticate(&headers(&value), &creds).await.unwrap_err();
            assert!(matches!(err, ApiError::Unauthenticated), "{value}: {err:?}");
        }

        let err = chain.authenticate(&HeaderMap::new(), &creds).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn empty_chain_rejects_everything() {
        let state = test_state();
        seed_user(&state, "frank", "frank-password").await;
        let creds = CredentialStore::from_ref(&state);
        let chain = AuthChain::new(Vec::new());
        let err = chain
            .authenticate(&headers(&basic("frank", "frank-password")), &creds)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }
}
