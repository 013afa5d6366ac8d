//! Process-local rate limit counters

use super::{RateLimitConfig, RateLimitResult, RateLimitStore};
use crate::repositories::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Closed windows are dropped once this many keys are tracked
const PRUNE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Fixed-window counters keyed by `scope:client`
#[derive(Clone, Default)]
pub struct MemoryRateLimitStore {
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl MemoryRateLimitStore {
    /// Number of keys currently tracked
    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.read().await.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) -> StoreResult<RateLimitResult> {
        let mut windows = self.windows.write().await;
        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, w| w.reset_at > now);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + config.window,
        });
        if window.reset_at <= now {
            *window = Window {
                count: 0,
                reset_at: now + config.window,
            };
        }

        if window.count >= config.max_requests {
            return Ok(RateLimitResult {
                allowed: false,
                limit: config.max_requests,
                remaining: 0,
                reset_at: window.reset_at,
            });
        }

        window.count += 1;
        Ok(RateLimitResult {
            allowed: true,
            limit: config.max_requests,
            remaining: config.max_requests - window.count,
            reset_at: window.reset_at,
        })
    }

    async fn refund(&self, key: &str, now: DateTime<Utc>) -> StoreResult<()> {
        let mut windows = self.windows.write().await;
        if let Some(window) = windows.get_mut(key) {
            if window.reset_at > now {
                window.count = window.count.saturating_sub(1);
            }
        }
        Ok(())
    }
}
