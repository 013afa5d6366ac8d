//! Periodic purge of expired refresh tokens

use crate::repositories::RefreshTokenLedger;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Run one purge pass, returning the number of deleted records
pub async fn purge_once(ledger: &dyn RefreshTokenLedger) -> u64 {
    match ledger.purge_expired(Utc::now()).await {
        Ok(0) => {
            debug!("No expired refresh tokens to purge");
            0
        }
        Ok(purged) => {
            info!(purged, "Purged expired refresh tokens");
            purged
        }
        Err(e) => {
            error!("Refresh token purge failed: {:?}", e);
            0
        }
    }
}

/// Purge expired tokens every `every` until `shutdown` flips to true
pub fn spawn_purge_task(
    ledger: Arc<dyn RefreshTokenLedger>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    purge_once(ledger.as_ref()).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Refresh token purge task stopping");
                        break;
                    }
                }
            }
        }
    })
}
