pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::services::storage::StorageService;

/// Shared startup for both binaries: config, tracing, metrics, database
/// with migrations applied, Redis and object storage.
async fn bootstrap(service: &'static str) -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings, service)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    match redis.connect().await {
        Ok(()) => tracing::info!("Redis connected successfully"),
        Err(err) => {
            tracing::error!(error = %err, "Failed to connect to Redis; rate limits disabled")
        }
    }

    let storage = StorageService::from_settings(&settings).await?;
    if storage.is_none() {
        tracing::warn!("Object storage not configured; video uploads disabled");
    }

    AppState::new(settings, db_pool, redis, storage)
}

pub async fn run() -> anyhow::Result<()> {
    let state = bootstrap("kodeto-api").await?;

    if let Err(err) = core::bootstrap::ensure_superuser(&state).await {
        tracing::error!(error = %err, "Failed to ensure default superuser");
    }
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Kodeto LMS API listening"
    );

    // Verification logs need the peer address when no proxy header is present.
    let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(core::shutdown::shutdown_signal())
        .await;

    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");

    result?;
    Ok(())
}

pub async fn run_worker() -> anyhow::Result<()> {
    let state = bootstrap("kodeto-worker").await?;
    tracing::info!("Kodeto worker started");

    let result = tasks::scheduler::run(state.clone()).await;

    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");

    result
}
