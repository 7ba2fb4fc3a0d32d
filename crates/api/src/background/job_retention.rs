//! Periodic pruning of delivery jobs past the retention window.
//!
//! Jobs are also pruned when the store is loaded at startup; this sweep keeps
//! a long-running server from accumulating them.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use mediadesk_worker::DeliveryService;

/// How often the sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the retention sweep loop until `cancel` is triggered.
pub async fn run(delivery: Arc<DeliveryService>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        retention_days = delivery.config().retention.num_days(),
        interval_secs = interval.as_secs(),
        "Job retention sweep started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let pruned = delivery.prune_expired().await;
                if pruned > 0 {
                    tracing::info!(pruned, "Job retention: pruned expired jobs");
                } else {
                    tracing::debug!("Job retention: nothing to prune");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadesk_db::MemoryKvStore;
    use mediadesk_events::EventBus;
    use mediadesk_worker::DeliveryConfig;

    #[tokio::test(start_paused = true)]
    async fn sweep_stops_on_cancel() {
        let delivery = DeliveryService::start(
            Arc::new(MemoryKvStore::new()),
            Arc::new(EventBus::default()),
            DeliveryConfig::default(),
        )
        .await;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(delivery, Duration::from_secs(60), cancel.clone()));

        tokio::time::sleep(Duration::from_secs(180)).await;
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.await.unwrap();
    }
}
