//! PawCare backend
//!
//! Pet-care platform API: accounts with access/refresh token sessions,
//! pet profiles and service bookings.
//!
//! ## Architecture
//!
//! - Routes: HTTP request handling and routing
//! - Services: auth orchestration, pets, bookings
//! - Repositories: store traits with Postgres and in-memory backends
//! - Database: PostgreSQL with SQLx

use anyhow::Result;
use pawcare_backend::{
    config::AppConfig, db, repositories::Stores, routes, services::token_cleanup,
    state::AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if AppConfig::is_production() { "production" } else { "development" },
        "Starting PawCare backend"
    );

    if AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    info!("Connecting to database...");
    let pool = db::create_pool(&config.database).await?;

    // Production runs migrations as a separate job
    if !AppConfig::is_production() {
        db::run_migrations(&pool).await?;
    }

    let stores = Stores::postgres(pool);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let purge_task = token_cleanup::spawn_purge_task(
        stores.refresh_tokens.clone(),
        Duration::from_secs(config.cleanup.interval_secs.max(1)),
        shutdown_rx,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(stores.clone(), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = purge_task.await {
        warn!("Refresh token purge task ended abnormally: {}", e);
    }
    stores.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if AppConfig::is_production() {
            "pawcare_backend=info,tower_http=info".into()
        } else {
            "pawcare_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if AppConfig::is_production() {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Refuse to start in production with weak secrets or a cheap hash cost
fn validate_production_config(config: &AppConfig) -> Result<()> {
    let issues = config.production_issues();

    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }
    if !config.cookie.secure {
        warn!("Refresh cookie is not marked Secure");
    }

    if !issues.is_empty() {
        for issue in &issues {
            error!("Configuration error: {}", issue);
        }
        anyhow::bail!("Invalid production configuration");
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
