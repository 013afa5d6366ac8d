//! Per-client request rate limiting
//!
//! Fixed windows: the first request for a key opens a window, and
//! requests past `max_requests` inside it are refused until it closes.
//! Keys are `scope:client`, so limiters sharing a store never share
//! counters unless they share a scope.

mod memory;

pub use memory::MemoryRateLimitStore;

use crate::config::RateLimitSettings;
use crate::repositories::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Longest window accepted from configuration
const MAX_WINDOW_SECS: u64 = 86_400;

pub const MSG_AUTH_LIMITED: &str =
    "Too many authentication attempts, please try again after 15 minutes";
pub const MSG_REFRESH_LIMITED: &str = "Too many requests, please try again later";
pub const MSG_API_LIMITED: &str = "API rate limit exceeded, please try again later";

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(window_secs.min(MAX_WINDOW_SECS) as i64),
        }
    }
}

/// Outcome of one rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitResult {
    /// Whole seconds until the window closes, never negative
    pub fn reset_after_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.reset_at - now).num_seconds().max(0)
    }
}

/// Counter storage for rate limiting
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` unless its window is already full
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) -> StoreResult<RateLimitResult>;

    /// Give back one counted request in the current window
    async fn refund(&self, key: &str, now: DateTime<Utc>) -> StoreResult<()>;
}

/// A named limit applied to one group of routes
#[derive(Clone)]
pub struct RateLimiter {
    scope: &'static str,
    config: RateLimitConfig,
    message: &'static str,
    count_successful: bool,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(
        scope: &'static str,
        config: RateLimitConfig,
        message: &'static str,
        store: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self {
            scope,
            config,
            message,
            count_successful: true,
            store,
        }
    }

    /// Only failed requests use up the allowance
    pub fn skip_successful(mut self) -> Self {
        self.count_successful = false;
        self
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn counts_successful(&self) -> bool {
        self.count_successful
    }

    pub async fn check(&self, client: &str, now: DateTime<Utc>) -> StoreResult<RateLimitResult> {
        self.store
            .check_and_increment(&self.key(client), &self.config, now)
            .await
    }

    pub async fn refund(&self, client: &str, now: DateTime<Utc>) -> StoreResult<()> {
        self.store.refund(&self.key(client), now).await
    }

    fn key(&self, client: &str) -> String {
        format!("{}:{}", self.scope, client)
    }
}

/// The limiters the router installs
#[derive(Clone)]
pub struct RateLimits {
    /// Register and login; failures only
    pub auth: RateLimiter,
    pub refresh: RateLimiter,
    /// Everything under `/api/v1`
    pub api: RateLimiter,
}

impl RateLimits {
    pub fn new(settings: &RateLimitSettings, store: Arc<dyn RateLimitStore>) -> Self {
        let window = settings.window_secs;
        Self {
            auth: RateLimiter::new(
                "auth",
                RateLimitConfig::new(settings.auth_max, window),
                MSG_AUTH_LIMITED,
                store.clone(),
            )
            .skip_successful(),
            refresh: RateLimiter::new(
                "refresh",
                RateLimitConfig::new(settings.refresh_max, window),
                MSG_REFRESH_LIMITED,
                store.clone(),
            ),
            api: RateLimiter::new(
                "api",
                RateLimitConfig::new(settings.api_max, window),
                MSG_API_LIMITED,
                store,
            ),
        }
    }

    /// Limiters over a process-local store, or `None` when disabled
    pub fn from_settings(settings: &RateLimitSettings) -> Option<Self> {
        settings
            .enabled
            .then(|| Self::new(settings, Arc::new(MemoryRateLimitStore::default())))
    }
}
