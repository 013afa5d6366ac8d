//! Postgres pool lifecycle
//!
//! Opening the pool, running migrations and the readiness probe query.
//! Closing happens through [`crate::repositories::Stores::close`].

use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Pool tuning that is not exposed through configuration
pub struct PoolLimits {
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Open a connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    create_pool_with_limits(config, &PoolLimits::default()).await
}

pub async fn create_pool_with_limits(config: &DatabaseConfig, limits: &PoolLimits) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&config.url)
        .context("invalid database URL")?
        .application_name("pawcare");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(limits.min_connections.min(config.max_connections))
        .acquire_timeout(limits.acquire_timeout)
        .idle_timeout(limits.idle_timeout)
        .max_lifetime(limits.max_lifetime)
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
        .context("failed to connect to the database")?;

    info!(max = config.max_connections, "Database pool created");
    Ok(pool)
}

/// Apply pending migrations from `backend/migrations`
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}

/// Round-trip a trivial query
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!("Database health check failed: {}", e);
            e.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_limits() {
        let limits = PoolLimits::default();
        assert_eq!(limits.min_connections, 1);
        assert!(limits.acquire_timeout < limits.idle_timeout);
        assert!(limits.idle_timeout < limits.max_lifetime);
    }

    #[tokio::test]
    async fn test_create_pool_rejects_malformed_url() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            max_connections: 2,
        };
        let err = create_pool(&config).await.unwrap_err();
        assert!(err.to_string().contains("invalid database URL"));
    }
}
