//! The delivery service: job store, registries and simulator supervision.
//!
//! All state lives in one [`DeliveryState`] behind a single `tokio` mutex.
//! Every command and every simulator tick is a read-modify-write under that
//! lock, and the set of running simulators is part of the same state, so a
//! retry can never race a simulator that is shutting down.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use mediadesk_core::delivery::destination::{
    CreateDestination, DeliveryDestination, UpdateDestination,
};
use mediadesk_core::delivery::job::{
    self, CreateDeliveryJob, DeliveryJob, JobStatus, DEFAULT_RETENTION_DAYS, RETRY_GUIDANCE,
};
use mediadesk_core::delivery::preset::{
    resolve_preset, CreatePreset, DeliveryPreset, UpdatePreset,
};
use mediadesk_core::delivery::simulation::{advance, ProgressCursor, SimulationParams, TickOutcome};
use mediadesk_core::error::CoreError;
use mediadesk_core::job_events::{
    EVENT_DESTINATION_CHANGED, EVENT_JOB_CANCELLED, EVENT_JOB_COMPLETED, EVENT_JOB_CREATED,
    EVENT_JOB_FAILED, EVENT_JOB_PROGRESS, EVENT_JOB_RETRIED, EVENT_JOB_STARTED,
    EVENT_PRESET_CHANGED,
};
use mediadesk_core::types::EntityId;
use mediadesk_db::repositories::{DestinationRepo, JobRepo, PresetRepo};
use mediadesk_db::KvHandle;
use mediadesk_events::{EventBus, PlatformEvent};

use crate::{seed, simulator};

/// Page size used when a listing does not specify one.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Largest page a listing may request.
pub const MAX_LIST_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Config & filters
// ---------------------------------------------------------------------------

/// Tunables for the delivery service.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryConfig {
    pub simulation: SimulationParams,
    /// Jobs created longer ago than this are pruned.
    pub retention: chrono::Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationParams::default(),
            retention: chrono::Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }
}

/// Job listing filter.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DeliveryState {
    /// Newest first.
    jobs: Vec<DeliveryJob>,
    destinations: Vec<DeliveryDestination>,
    presets: Vec<DeliveryPreset>,
    /// Running simulators keyed by job id.
    active: HashMap<EntityId, CancellationToken>,
}

/// Owns delivery state and runs the per-job simulators.
///
/// Created once at startup via [`DeliveryService::start`]; the returned
/// `Arc` is cloned into request handlers and background tasks.
pub struct DeliveryService {
    state: Mutex<DeliveryState>,
    store: KvHandle,
    bus: Arc<EventBus>,
    config: DeliveryConfig,
    /// Master token; every simulator token is a child of it.
    cancel: CancellationToken,
}

impl DeliveryService {
    /// Load persisted state, seed empty registries and resume simulators for
    /// every job that is not terminal.
    pub async fn start(store: KvHandle, bus: Arc<EventBus>, config: DeliveryConfig) -> Arc<Self> {
        let now = Utc::now();

        let jobs = JobRepo::load(store.as_ref(), now, config.retention)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to load delivery jobs, starting empty");
                Vec::new()
            });

        let destinations = match DestinationRepo::load(store.as_ref()).await {
            Ok(Some(list)) => list,
            Ok(None) => seed_or_empty("destinations", seed::default_destinations(now)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load destinations, using defaults");
                seed_or_empty("destinations", seed::default_destinations(now))
            }
        };

        let presets = match PresetRepo::load(store.as_ref()).await {
            Ok(Some(list)) => list,
            Ok(None) => seed_or_empty("presets", seed::default_presets(&destinations, now)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load presets, using defaults");
                seed_or_empty("presets", seed::default_presets(&destinations, now))
            }
        };

        tracing::info!(
            jobs = jobs.len(),
            destinations = destinations.len(),
            presets = presets.len(),
            "Delivery state loaded"
        );

        let service = Arc::new(Self {
            state: Mutex::new(DeliveryState {
                jobs,
                destinations,
                presets,
                active: HashMap::new(),
            }),
            store,
            bus,
            config,
            cancel: CancellationToken::new(),
        });

        {
            let mut guard = service.state.lock().await;
            let state = &mut *guard;
            service.persist_all(state).await;

            let resumable: Vec<_> = state
                .jobs
                .iter()
                .filter(|j| !j.is_terminal())
                .map(|j| (j.id, ProgressCursor::resume(j)))
                .collect();
            if !resumable.is_empty() {
                tracing::info!(count = resumable.len(), "Resuming delivery simulators");
            }
            for (job_id, cursor) in resumable {
                service.spawn_simulator(&mut state.active, job_id, cursor);
            }
        }

        service
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Number of simulators currently registered.
    pub async fn active_simulators(&self) -> usize {
        self.state.lock().await.active.len()
    }

    /// Whether the backing store accepts reads and writes.
    pub async fn persistence_healthy(&self) -> bool {
        mediadesk_db::health_check(self.store.as_ref()).await.is_ok()
    }

    /// Stop every simulator and flush all state.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down delivery service");
        self.cancel.cancel();

        let mut guard = self.state.lock().await;
        guard.active.clear();
        self.persist_all(&guard).await;

        tracing::info!("Delivery service shut down complete");
    }

    /* -------------------------------------------------------------------- */
    /* Jobs                                                                 */
    /* -------------------------------------------------------------------- */

    /// Create a job from a preset (explicit, else the first one) and start
    /// its simulator.
    pub async fn create_job(
        self: &Arc<Self>,
        input: CreateDeliveryJob,
    ) -> Result<DeliveryJob, CoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let preset = resolve_preset(&state.presets, input.preset_id)?;
        let job = DeliveryJob::create(input, preset, &state.destinations, Utc::now())?;
        state.jobs.insert(0, job.clone());
        self.spawn_simulator(&mut state.active, job.id, ProgressCursor::resume(&job));

        self.save_jobs(state).await;
        self.publish_job(state, EVENT_JOB_CREATED, &job);
        tracing::info!(
            job_id = %job.id,
            preset = %job.preset_name,
            destinations = job.destinations.len(),
            "Delivery job created"
        );
        Ok(job)
    }

    pub async fn get_job(&self, id: EntityId) -> Result<DeliveryJob, CoreError> {
        let state = self.state.lock().await;
        find(&state.jobs, id, |j| j.id, "DeliveryJob").cloned()
    }

    /// List jobs, newest first.
    pub async fn list_jobs(&self, filter: &JobFilter) -> Vec<DeliveryJob> {
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .min(MAX_LIST_LIMIT);
        let state = self.state.lock().await;
        state
            .jobs
            .iter()
            .filter(|j| filter.status.map_or(true, |s| j.status == s))
            .skip(filter.offset.unwrap_or(0))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Requeue a failed job and replay its simulation.
    pub async fn retry_job(self: &Arc<Self>, id: EntityId) -> Result<DeliveryJob, CoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let job = find_mut(&mut state.jobs, id, |j| j.id, "DeliveryJob")?;
        job.retry()?;
        if job.exceeds_retry_guidance() {
            tracing::warn!(
                job_id = %id,
                retry_count = job.retry_count,
                guidance = RETRY_GUIDANCE,
                "Delivery job retried past the suggested limit"
            );
        }
        let snapshot = job.clone();
        self.spawn_simulator(&mut state.active, id, ProgressCursor::resume(&snapshot));

        self.save_jobs(state).await;
        self.publish_job(state, EVENT_JOB_RETRIED, &snapshot);
        tracing::info!(job_id = %id, retry_count = snapshot.retry_count, "Delivery job retried");
        Ok(snapshot)
    }

    /// Cancel a queued or delivering job.
    pub async fn cancel_job(&self, id: EntityId) -> Result<DeliveryJob, CoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let job = find_mut(&mut state.jobs, id, |j| j.id, "DeliveryJob")?;
        job.cancel()?;
        let snapshot = job.clone();
        stop_simulator(&mut state.active, id);

        self.save_jobs(state).await;
        self.publish_job(state, EVENT_JOB_CANCELLED, &snapshot);
        tracing::info!(job_id = %id, "Delivery job cancelled");
        Ok(snapshot)
    }

    /// Fail a non-terminal job with an externally reported reason.
    pub async fn fail_job(&self, id: EntityId, reason: &str) -> Result<DeliveryJob, CoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let job = find_mut(&mut state.jobs, id, |j| j.id, "DeliveryJob")?;
        job.fail(reason)?;
        let snapshot = job.clone();
        stop_simulator(&mut state.active, id);

        self.save_jobs(state).await;
        self.publish_job(state, EVENT_JOB_FAILED, &snapshot);
        tracing::warn!(job_id = %id, error = ?snapshot.error, "Delivery job failed");
        Ok(snapshot)
    }

    /// Drop jobs older than the retention window. Returns how many were
    /// removed.
    pub async fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let expired: Vec<EntityId> = state
            .jobs
            .iter()
            .filter(|j| j.is_expired(now, self.config.retention))
            .map(|j| j.id)
            .collect();
        if expired.is_empty() {
            return 0;
        }
        for id in &expired {
            stop_simulator(&mut state.active, *id);
        }
        let removed = job::prune_expired(&mut state.jobs, now, self.config.retention);
        self.save_jobs(state).await;
        tracing::info!(removed, kept = state.jobs.len(), "Pruned expired delivery jobs");
        removed
    }

    /// One simulator tick for `job_id`. Called by the simulator task only.
    pub(crate) async fn tick<R: Rng + ?Sized>(
        &self,
        job_id: EntityId,
        cursor: &mut ProgressCursor,
        rng: &mut R,
        token: &CancellationToken,
    ) -> TickOutcome {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        // Tokens are only cancelled under this lock, so this check is exact.
        if token.is_cancelled() {
            return TickOutcome::Stopped;
        }
        let Some(job) = state.jobs.iter_mut().find(|j| j.id == job_id) else {
            state.active.remove(&job_id);
            return TickOutcome::Stopped;
        };

        let outcome = advance(job, cursor, &self.config.simulation, rng, Utc::now());
        let snapshot = job.clone();
        if outcome.is_final() {
            state.active.remove(&job_id);
        }

        let event_type = match outcome {
            TickOutcome::Stopped | TickOutcome::Waiting => return outcome,
            TickOutcome::Started => EVENT_JOB_STARTED,
            TickOutcome::HandedOff | TickOutcome::Advanced => EVENT_JOB_PROGRESS,
            TickOutcome::Completed => EVENT_JOB_COMPLETED,
        };
        self.save_jobs(state).await;
        self.publish_job(state, event_type, &snapshot);

        match outcome {
            TickOutcome::Started => tracing::info!(job_id = %job_id, "Delivery job started"),
            TickOutcome::HandedOff => {
                tracing::debug!(job_id = %job_id, "Delivery job uploading to destinations")
            }
            TickOutcome::Completed => tracing::info!(job_id = %job_id, "Delivery job completed"),
            _ => {}
        }
        outcome
    }

    /* -------------------------------------------------------------------- */
    /* Destinations                                                         */
    /* -------------------------------------------------------------------- */

    pub async fn list_destinations(&self) -> Vec<DeliveryDestination> {
        self.state.lock().await.destinations.clone()
    }

    pub async fn get_destination(&self, id: EntityId) -> Result<DeliveryDestination, CoreError> {
        let state = self.state.lock().await;
        find(&state.destinations, id, |d| d.id, "DeliveryDestination").cloned()
    }

    pub async fn create_destination(
        &self,
        input: CreateDestination,
    ) -> Result<DeliveryDestination, CoreError> {
        let destination = DeliveryDestination::create(input, Utc::now())?;
        let mut state = self.state.lock().await;
        state.destinations.push(destination.clone());
        self.save_destinations(&state).await;
        self.publish_destination("created", &destination);
        Ok(destination)
    }

    pub async fn update_destination(
        &self,
        id: EntityId,
        input: UpdateDestination,
    ) -> Result<DeliveryDestination, CoreError> {
        let mut state = self.state.lock().await;
        let destination = find_mut(&mut state.destinations, id, |d| d.id, "DeliveryDestination")?;
        destination.apply_update(input, Utc::now())?;
        let snapshot = destination.clone();
        self.save_destinations(&state).await;
        self.publish_destination("updated", &snapshot);
        Ok(snapshot)
    }

    /// Flip a destination's activation flag.
    pub async fn toggle_destination(&self, id: EntityId) -> Result<DeliveryDestination, CoreError> {
        let mut state = self.state.lock().await;
        let destination = find_mut(&mut state.destinations, id, |d| d.id, "DeliveryDestination")?;
        let active = destination.toggle_active(Utc::now());
        let snapshot = destination.clone();
        self.save_destinations(&state).await;
        self.publish_destination("toggled", &snapshot);
        tracing::info!(destination_id = %id, active, "Destination toggled");
        Ok(snapshot)
    }

    /// Remove a destination. Destinations still listed by a preset cannot be
    /// removed.
    pub async fn delete_destination(&self, id: EntityId) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        find(&state.destinations, id, |d| d.id, "DeliveryDestination")?;
        if let Some(preset) = state.presets.iter().find(|p| p.destination_ids.contains(&id)) {
            return Err(CoreError::Conflict(format!(
                "Destination is used by preset '{}'",
                preset.name
            )));
        }
        let removed = state
            .destinations
            .iter()
            .position(|d| d.id == id)
            .map(|idx| state.destinations.remove(idx));
        self.save_destinations(&state).await;
        if let Some(destination) = removed {
            self.publish_destination("deleted", &destination);
        }
        Ok(())
    }

    /* -------------------------------------------------------------------- */
    /* Presets                                                              */
    /* -------------------------------------------------------------------- */

    pub async fn list_presets(&self) -> Vec<DeliveryPreset> {
        self.state.lock().await.presets.clone()
    }

    pub async fn get_preset(&self, id: EntityId) -> Result<DeliveryPreset, CoreError> {
        let state = self.state.lock().await;
        find(&state.presets, id, |p| p.id, "DeliveryPreset").cloned()
    }

    /// Save a new preset. Marking it default clears the flag elsewhere.
    pub async fn create_preset(&self, input: CreatePreset) -> Result<DeliveryPreset, CoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let preset = DeliveryPreset::create(input, &state.destinations, Utc::now())?;
        state.presets.push(preset.clone());
        if preset.is_default {
            make_sole_default(&mut state.presets, preset.id);
        }
        self.save_presets(state).await;
        self.publish_preset("created", &preset);
        Ok(preset)
    }

    pub async fn update_preset(
        &self,
        id: EntityId,
        input: UpdatePreset,
    ) -> Result<DeliveryPreset, CoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let preset = find_mut(&mut state.presets, id, |p| p.id, "DeliveryPreset")?;
        preset.apply_update(input, &state.destinations, Utc::now())?;
        let snapshot = preset.clone();
        if snapshot.is_default {
            make_sole_default(&mut state.presets, id);
        }
        self.save_presets(state).await;
        self.publish_preset("updated", &snapshot);
        Ok(snapshot)
    }

    /// Remove a preset. Existing jobs keep their snapshot.
    pub async fn delete_preset(&self, id: EntityId) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        let idx = state
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or(CoreError::NotFound {
                entity: "DeliveryPreset",
                id,
            })?;
        let preset = state.presets.remove(idx);
        self.save_presets(&state).await;
        self.publish_preset("deleted", &preset);
        Ok(())
    }

    // ---- private helpers ----

    fn spawn_simulator(
        self: &Arc<Self>,
        active: &mut HashMap<EntityId, CancellationToken>,
        job_id: EntityId,
        cursor: ProgressCursor,
    ) {
        if active.contains_key(&job_id) {
            return;
        }
        let token = self.cancel.child_token();
        active.insert(job_id, token.clone());
        tokio::spawn(simulator::run(Arc::clone(self), job_id, cursor, token));
    }

    /// Publish a job event, stamping the preset's webhook when it asked to
    /// be notified of this event.
    fn publish_job(&self, state: &DeliveryState, event_type: &str, job: &DeliveryJob) {
        let webhook = state
            .presets
            .iter()
            .find(|p| p.id == job.preset_id)
            .and_then(|p| p.notifications.webhook_for(event_type));

        let mut payload = serde_json::json!({ "job": job });
        if let Some(url) = webhook {
            payload["webhook_url"] = serde_json::Value::String(url.to_string());
        }
        self.bus.publish(
            PlatformEvent::new(event_type)
                .with_source("delivery_job", job.id)
                .with_payload(payload),
        );
    }

    fn publish_destination(&self, action: &str, destination: &DeliveryDestination) {
        self.bus.publish(
            PlatformEvent::new(EVENT_DESTINATION_CHANGED)
                .with_source("delivery_destination", destination.id)
                .with_payload(serde_json::json!({ "action": action, "destination": destination })),
        );
    }

    fn publish_preset(&self, action: &str, preset: &DeliveryPreset) {
        self.bus.publish(
            PlatformEvent::new(EVENT_PRESET_CHANGED)
                .with_source("delivery_preset", preset.id)
                .with_payload(serde_json::json!({ "action": action, "preset": preset })),
        );
    }

    async fn save_jobs(&self, state: &DeliveryState) {
        if let Err(e) = JobRepo::save(self.store.as_ref(), &state.jobs).await {
            tracing::error!(error = %e, "Failed to persist delivery jobs");
        }
    }

    async fn save_destinations(&self, state: &DeliveryState) {
        if let Err(e) = DestinationRepo::save(self.store.as_ref(), &state.destinations).await {
            tracing::error!(error = %e, "Failed to persist destinations");
        }
    }

    async fn save_presets(&self, state: &DeliveryState) {
        if let Err(e) = PresetRepo::save(self.store.as_ref(), &state.presets).await {
            tracing::error!(error = %e, "Failed to persist presets");
        }
    }

    async fn persist_all(&self, state: &DeliveryState) {
        self.save_jobs(state).await;
        self.save_destinations(state).await;
        self.save_presets(state).await;
    }
}

fn seed_or_empty<T>(what: &str, seeded: Result<Vec<T>, CoreError>) -> Vec<T> {
    seeded.unwrap_or_else(|e| {
        tracing::error!(what, error = %e, "Failed to build default registry");
        Vec::new()
    })
}

fn stop_simulator(active: &mut HashMap<EntityId, CancellationToken>, job_id: EntityId) {
    if let Some(token) = active.remove(&job_id) {
        token.cancel();
    }
}

fn make_sole_default(presets: &mut [DeliveryPreset], id: EntityId) {
    for preset in presets.iter_mut().filter(|p| p.id != id) {
        preset.is_default = false;
    }
}

fn find<'a, T>(
    items: &'a [T],
    id: EntityId,
    key: impl Fn(&T) -> EntityId,
    entity: &'static str,
) -> Result<&'a T, CoreError> {
    items
        .iter()
        .find(|item| key(item) == id)
        .ok_or(CoreError::NotFound { entity, id })
}

fn find_mut<'a, T>(
    items: &'a mut [T],
    id: EntityId,
    key: impl Fn(&T) -> EntityId,
    entity: &'static str,
) -> Result<&'a mut T, CoreError> {
    items
        .iter_mut()
        .find(|item| key(item) == id)
        .ok_or(CoreError::NotFound { entity, id })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
