use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::AppConfig, error::StoreError};

/// Connects to Postgres and applies the embedded migrations.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    Ok(db)
}

/// Relational handle backing both the user and post stores.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Translates constraint violations into store-level errors.
pub(crate) fn classify(
    err: sqlx::Error,
    unique: &'static str,
    reference: &'static str,
) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(unique);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(reference);
        }
    }
    StoreError::Database(err)
}
