use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

mod config;
mod data;
mod features;
mod handlers;
mod schema;
mod utils;

use config::AppConfig;
use data::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;

    // Database configuration
    let pool = db::create_pool(&config.database_url)
        .with_context(|| format!("Failed to create DB pool for {}", config.database_url))?;
    {
        let mut conn = pool.get().context("Failed to get DB connection")?;
        db::init_schema(&mut conn).context("Failed to create review schema")?;
    }

    // Sessions configuration; the auth layer stores `user_id` here
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_expiry(Expiry::OnInactivity(Duration::days(config.session_expiry_days)))
        .with_secure(false);

    let scheduler_config = Arc::new(config.scheduler.clone());
    log::info!(
        "Scheduler: daily cap {}, failure threshold {}, relearn delay {}h",
        scheduler_config.daily_cap,
        scheduler_config.failure_threshold,
        scheduler_config.relearn_delay_hours
    );

    let api_router = Router::new().nest(
        "/review",
        handlers::review::review_router(pool.clone(), scheduler_config),
    );

    let app = Router::new()
        .nest("/api", api_router)
        .layer(session_layer);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    log::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
