mod accounts;
mod admin;
mod auth;
mod config;
mod db;
mod errors;
mod intake;
mod models;
mod routes;
mod state;
mod store;
mod student;
mod views;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::session::RedisSessionStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::intake::ResumeStorage;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Placement API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed sessions
    let redis = redis::Client::open(config.redis_url.clone())?
        .get_connection_manager()
        .await
        .context("Failed to connect to Redis")?;
    info!(
        "Redis session store initialized (ttl {}s)",
        config.session_ttl_secs
    );

    let resumes = ResumeStorage::init(config.upload_dir.clone()).await?;

    if config.allow_admin_signup {
        warn!("ALLOW_ADMIN_SIGNUP is on: anyone can self-register an admin account");
    }

    let state = AppState {
        store: Arc::new(PgStore::new(db)),
        sessions: Arc::new(RedisSessionStore::new(redis, config.session_ttl_secs)),
        resumes,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
