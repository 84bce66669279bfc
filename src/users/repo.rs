use async_trait::async_trait;

use crate::{
    db::{classify, PgStore},
    error::StoreError,
    users::repo_types::{NewUser, User, UserChanges},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users ordered by id.
    async fn all(&self) -> Result<Vec<User>, StoreError>;
    async fn get(&self, id: i64) -> Result<User, StoreError>;
    async fn exists(&self, id: i64) -> Result<bool, StoreError>;
    /// Looks up an already normalized username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, StoreError>;
    /// Removes the user and, through the foreign key, every post it owns.
    async fn delete(&self, id: i64) -> Result<User, StoreError>;
}

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, last_modified";

#[async_trait]
impl UserStore for PgStore {
    async fn all(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn get(&self, id: i64) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(found)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, "username", "user_id"))
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, StoreError> {
        if changes.is_empty() {
            return self.get(id).await;
        }
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET email = COALESCE($2, email),
                   password_hash = COALESCE($3, password_hash),
                   last_modified = GREATEST(last_modified, now())
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
