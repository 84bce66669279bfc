use anyhow::Context;
use tracing::info;

use crate::{
    auth::password::hash_password,
    config::AdminConfig,
    error::StoreError,
    users::{repo::UserStore, repo_types::NewUser},
    validation::normalize,
};

/// Creates the configured admin account unless a user with that name exists.
/// Returns whether a user was created.
pub async fn ensure_admin(users: &dyn UserStore, admin: &AdminConfig) -> anyhow::Result<bool> {
    let username = normalize(&admin.username);
    anyhow::ensure!(!username.is_empty(), "API_ADMIN_USERNAME is blank");

    if users.find_by_username(&username).await?.is_some() {
        info!(%username, "admin account present");
        return Ok(false);
    }

    let password_hash = hash_password(&admin.password).context("hash admin password")?;
    let created = users
        .insert(NewUser {
            username: username.clone(),
            email: normalize(&admin.email),
            password_hash,
        })
        .await;

    match created {
        Ok(user) => {
            info!(user_id = user.id, %username, "admin account created");
            Ok(true)
        }
        // another instance won the race
        Err(StoreError::Duplicate(_)) => Ok(false),
        Err(e) => Err(e).context("create admin account"),
    }
}
