mod app;
mod auth;
mod bootstrap;
mod config;
mod db;
mod error;
mod extractors;
mod posts;
mod state;
#[cfg(test)]
mod testing;
mod users;
mod validation;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "postboard=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config).await?;

    match &app_state.config.admin {
        Some(admin) => {
            bootstrap::ensure_admin(app_state.users.as_ref(), admin).await?;
        }
        None => {
            tracing::warn!("API_ADMIN_USERNAME/API_ADMIN_PASSWORD not set; no admin account seeded")
        }
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
