use async_trait::async_trait;

use crate::{
    db::{classify, PgStore},
    error::StoreError,
    posts::repo_types::{NewPost, Post, PostChanges},
};

#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts ordered by id.
    async fn all(&self) -> Result<Vec<Post>, StoreError>;
    async fn get(&self, id: i64) -> Result<Post, StoreError>;
    /// Fails with `MissingReference("user_id")` when the owner does not exist.
    async fn insert(&self, post: NewPost) -> Result<Post, StoreError>;
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, StoreError>;
    async fn delete(&self, id: i64) -> Result<Post, StoreError>;
}

#[async_trait]
impl PostStore for PgStore {
    async fn all(&self) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, body, user_id, created_at, last_modified
              FROM posts
             ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(posts)
    }

    async fn get(&self, id: i64) -> Result<Post, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, body, user_id, created_at, last_modified
              FROM posts
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, body, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, body, user_id, created_at, last_modified
            "#,
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.user_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, "id", "user_id"))
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, StoreError> {
        if changes.is_empty() {
            return self.get(id).await;
        }
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
               SET title = COALESCE($2, title),
                   body = COALESCE($3, body),
                   last_modified = GREATEST(last_modified, now())
             WHERE id = $1
            RETURNING id, title, body, user_id, created_at, last_modified
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.body)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<Post, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            DELETE FROM posts
             WHERE id = $1
            RETURNING id, title, body, user_id, created_at, last_modified
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }
}
