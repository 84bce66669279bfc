//! In-memory store and request helpers for tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64ct::{Base64, Encoding};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::password::hash_password,
    error::StoreError,
    posts::{
        repo::PostStore,
        repo_types::{NewPost, Post, PostChanges},
    },
    state::AppState,
    users::{
        repo::UserStore,
        repo_types::{NewUser, User, UserChanges},
    },
    validation::normalize,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    last_user_id: i64,
    last_post_id: i64,
}

/// Both stores over shared maps; cascades user deletes by hand.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }
}

fn touched(previous: OffsetDateTime) -> OffsetDateTime {
    previous.max(OffsetDateTime::now_utc())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables().users.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<User, StoreError> {
        self.tables().users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables().users.contains_key(&id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables();
        if t.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        t.last_user_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: t.last_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            last_modified: now,
        };
        t.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, StoreError> {
        let mut t = self.tables();
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if changes.is_empty() {
            return Ok(user.clone());
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.last_modified = touched(user.last_modified);
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<User, StoreError> {
        let mut t = self.tables();
        let user = t.users.remove(&id).ok_or(StoreError::NotFound)?;
        t.posts.retain(|_, p| p.user_id != id);
        Ok(user)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn all(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.tables().posts.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Post, StoreError> {
        self.tables().posts.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut t = self.tables();
        if !t.users.contains_key(&post.user_id) {
            return Err(StoreError::MissingReference("user_id"));
        }
        t.last_post_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = Post {
            id: t.last_post_id,
            title: post.title,
            body: post.body,
            user_id: post.user_id,
            created_at: now,
            last_modified: now,
        };
        t.posts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, StoreError> {
        let mut t = self.tables();
        let post = t.posts.get_mut(&id).ok_or(StoreError::NotFound)?;
        if changes.is_empty() {
            return Ok(post.clone());
        }
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(body) = changes.body {
            post.body = body;
        }
        post.last_modified = touched(post.last_modified);
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<Post, StoreError> {
        self.tables().posts.remove(&id).ok_or(StoreError::NotFound)
    }
}

pub fn test_state() -> AppState {
    AppState::fake()
}

pub fn test_app_with_state() -> (Router, AppState) {
    let state = test_state();
    (build_app(state.clone()), state)
}

/// Inserts a user with a real Argon2 hash of `password`.
pub async fn seed_user(state: &AppState, username: &str, password: &str) -> User {
    let username = normalize(username);
    state
        .users
        .insert(NewUser {
            email: format!("{username}@example.com"),
            username,
            password_hash: hash_password(password).expect("hash"),
        })
        .await
        .expect("seed user")
}

pub fn basic(username: &str, password: &str) -> String {
    let pair = format!("{username}:{password}");
    format!("Basic {}", Base64::encode_string(pair.as_bytes()))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Sends one request through the router; the body is `Value::Null` when empty.
pub async fn call(
    app: &Router,
    method: Method,
    path: &str,
    authorization: Option<String>,
    json: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(path);
    if let Some(value) = authorization {
        req = req.header(header::AUTHORIZATION, value);
    }
    let req = match json {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request");

    let res = app.clone().oneshot(req).await.expect("infallible");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            email: format!("{name}@x.io"),
            password_hash: "h".into(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order_and_listed_by_id() {
        let store = MemoryStore::default();
        let a = UserStore::insert(&store, new_user("a")).await.unwrap();
        let b = UserStore::insert(&store, new_user("b")).await.unwrap();
        assert!(a.id < b.id);
        let ids: Vec<i64> = UserStore::all(&store)
            .await
            .unwrap()
            .iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, [a.id, b.id]);
    }

    #[tokio::test]
    async fn exists_tracks_inserts_and_deletes() {
        let store = MemoryStore::default();
        let a = UserStore::insert(&store, new_user("a")).await.unwrap();
        assert!(store.exists(a.id).await.unwrap());
        assert!(!store.exists(a.id + 1).await.unwrap());

        UserStore::delete(&store, a.id).await.unwrap();
        assert!(!store.exists(a.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_store_error() {
        let store = MemoryStore::default();
        UserStore::insert(&store, new_user("a")).await.unwrap();
        let err = UserStore::insert(&store, new_user("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));
    }

    #[tokio::test]
    async fn empty_update_leaves_last_modified_alone() {
        let store = MemoryStore::default();
        let a = UserStore::insert(&store, new_user("a")).await.unwrap();
        let same = UserStore::update(&store, a.id, UserChanges::default()).await.unwrap();
        assert_eq!(same.last_modified, a.last_modified);
    }

    #[tokio::test]
    async fn delete_cascades_to_owned_posts_only() {
        let store = MemoryStore::default();
        let a = UserStore::insert(&store, new_user("a")).await.unwrap();
        let b = UserStore::insert(&store, new_user("b")).await.unwrap();
        for owner in [a.id, a.id, b.id] {
            PostStore::insert(
                &store,
                NewPost {
                    title: "t".into(),
                    body: "b".into(),
                    user_id: owner,
                },
            )
            .await
            .unwrap();
        }

        UserStore::delete(&store, a.id).await.unwrap();
        let left = PostStore::all(&store).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].user_id, b.id);
    }
}
