//! Persistence for the delivery job list.

use chrono::Duration;
use mediadesk_core::delivery::job::{prune_expired, DeliveryJob};
use mediadesk_core::types::Timestamp;

use crate::error::DbError;
use crate::kv::KvStore;

/// Storage key of the job list.
pub const JOBS_KEY: &str = "mediadesk.delivery.jobs";

/// Loads and saves the job list.
pub struct JobRepo;

impl JobRepo {
    /// Load persisted jobs, dropping those created before `now - retention`.
    ///
    /// A missing or corrupt blob yields an empty list.
    pub async fn load(
        store: &dyn KvStore,
        now: Timestamp,
        retention: Duration,
    ) -> Result<Vec<DeliveryJob>, DbError> {
        let mut jobs: Vec<DeliveryJob> = super::load_list(store, JOBS_KEY)
            .await?
            .unwrap_or_default();
        let pruned = prune_expired(&mut jobs, now, retention);
        if pruned > 0 {
            tracing::info!(pruned, kept = jobs.len(), "Pruned expired delivery jobs");
        }
        Ok(jobs)
    }

    /// Replace the persisted job list.
    pub async fn save(store: &dyn KvStore, jobs: &[DeliveryJob]) -> Result<(), DbError> {
        super::save_list(store, JOBS_KEY, jobs).await
    }
}
