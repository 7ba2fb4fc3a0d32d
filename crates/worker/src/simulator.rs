//! Per-job simulator task.
//!
//! Each active job gets one task that calls [`DeliveryService::tick`] on a
//! fixed interval until the job reaches a terminal state or the task's
//! cancellation token fires. The token is cancelled by cancel/fail commands
//! and by service shutdown.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use mediadesk_core::delivery::simulation::ProgressCursor;
use mediadesk_core::types::EntityId;

use crate::service::DeliveryService;

pub(crate) async fn run(
    service: Arc<DeliveryService>,
    job_id: EntityId,
    mut cursor: ProgressCursor,
    cancel: CancellationToken,
) {
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let mut interval = tokio::time::interval(service.config().simulation.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; progress starts one period in.
    interval.tick().await;

    tracing::debug!(job_id = %job_id, "Delivery simulator started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %job_id, "Delivery simulator cancelled");
                break;
            }
            _ = interval.tick() => {
                let outcome = service.tick(job_id, &mut cursor, &mut rng, &cancel).await;
                if outcome.is_final() {
                    tracing::debug!(job_id = %job_id, ?outcome, "Delivery simulator finished");
                    break;
                }
            }
        }
    }
}
