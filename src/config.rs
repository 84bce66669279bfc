use anyhow::Context;
use serde::Deserialize;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 85_400;
/// Ten years.
const MAX_TOKEN_TTL_SECONDS: i64 = 315_360_000;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_seconds: i64,
}

/// Account seeded at startup so the API has someone to authenticate as.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: Option<AdminConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = lookup("POSTGRES_USER")
                    .context("POSTGRES_USER or DATABASE_URL must be set")?;
                let password = lookup("POSTGRES_PASSWORD").unwrap_or_default();
                let host = lookup("POSTGRES_HOST").unwrap_or_else(|| "localhost".into());
                let port = lookup("POSTGRES_PORT").unwrap_or_else(|| "5432".into());
                let db = lookup("POSTGRES_DB").unwrap_or_else(|| "postboard".into());
                format!("postgres://{user}:{password}@{host}:{port}/{db}")
            }
        };

        let jwt = JwtConfig {
            secret: lookup("SECRET_KEY")
                .filter(|s| !s.trim().is_empty())
                .context("SECRET_KEY must be set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "postboard".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "postboard-api".into()),
            ttl_seconds: lookup("TOKEN_TTL_SECONDS")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| (1..=MAX_TOKEN_TTL_SECONDS).contains(v))
                .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS),
        };

        let admin = match (lookup("API_ADMIN_USERNAME"), lookup("API_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminConfig {
                username,
                password,
                email: lookup("API_ADMIN_EMAIL").unwrap_or_else(|| "admin@admin.com".into()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt,
            admin,
        })
    }
}
