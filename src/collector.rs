//! Background snapshot collection.
//!
//! Polls every configured inverter on a fixed interval and records the round.
//! Store failures are logged and the next tick tries again.

use std::time::Duration;

use sqlx::PgPool;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::fronius::Collector;
use crate::store;

// ---

pub fn spawn(pool: PgPool, collector: Collector, interval: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Collector started: {} devices every {}s",
            collector.devices().len(),
            interval.as_secs()
        );

        loop {
            ticker.tick().await;
            collect_once(&pool, &collector).await;
        }
    })
}

async fn collect_once(pool: &PgPool, collector: &Collector) {
    // ---
    let snapshots = collector.poll_all().await;
    let online = snapshots.iter().filter(|s| s.is_online()).count();

    match store::record_snapshots(pool, &snapshots).await {
        Ok(inserted) => tracing::debug!(
            "Recorded {} snapshots ({} of {} devices online)",
            inserted,
            online,
            snapshots.len()
        ),
        Err(e) => tracing::error!("Failed to record snapshots: {}", e),
    }
}
