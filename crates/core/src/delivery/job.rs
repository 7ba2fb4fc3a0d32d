//! Delivery jobs and their lifecycle commands.
//!
//! ```text
//! queued ──> processing ──> delivering ──> completed
//!   │                           │
//!   ├──── cancel() ─────────────┴──> cancelled
//!   └──── fail() (any non-terminal) ──> failed ── retry() ──> queued
//! ```
//!
//! Automatic transitions (queued → processing → delivering → completed) are
//! driven by [`crate::delivery::simulation::advance`]. This module holds the
//! job model and the user/external commands.

use serde::{Deserialize, Serialize};

use crate::delivery::destination::{DeliveryDestination, PlatformType};
use crate::delivery::preset::DeliveryPreset;
use crate::error::CoreError;
use crate::types::{new_id, EntityId, Timestamp};

/// Retry count shown to users as the suggested ceiling ("Retry N/3").
///
/// Guidance only: retries beyond it are allowed.
pub const RETRY_GUIDANCE: u32 = 3;

/// Default age after which persisted jobs are pruned.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Asset name used when a job is created without one.
pub const DEFAULT_ASSET_NAME: &str = "Untitled asset";

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a delivery job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Delivering,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states never change again without an explicit retry.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Serialized name value.
    pub fn name(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from the serialized name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "delivering" => Ok(Self::Delivering),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown job status '{other}'"
            ))),
        }
    }
}

/// Upload status of one destination within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationStatus {
    Pending,
    Uploading,
    Completed,
    Failed,
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Per-destination state inside a job. Name and platform are snapshots
/// taken when the job was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryJobDestination {
    pub destination_id: EntityId,
    pub destination_name: String,
    pub platform: PlatformType,
    pub status: DestinationStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryJobDestination {
    fn pending(destination: &DeliveryDestination) -> Self {
        Self {
            destination_id: destination.id,
            destination_name: destination.name.clone(),
            platform: destination.platform,
            status: DestinationStatus::Pending,
            progress: 0,
            url: None,
            error: None,
        }
    }

    fn reset(&mut self) {
        self.status = DestinationStatus::Pending;
        self.progress = 0;
        self.url = None;
        self.error = None;
    }
}

/// One request to deliver one asset to one or more destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryJob {
    pub id: EntityId,
    pub asset_id: String,
    pub asset_name: String,
    pub preset_id: EntityId,
    pub preset_name: String,
    pub destinations: Vec<DeliveryJobDestination>,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<Timestamp>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// DTO for creating a job. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDeliveryJob {
    pub asset_id: Option<String>,
    pub asset_name: Option<String>,
    pub preset_id: Option<EntityId>,
}

impl DeliveryJob {
    /// Build a queued job from a preset, snapshotting its destinations.
    ///
    /// Destinations are expanded in the preset's order. Ids missing from
    /// `registry` and inactive destinations are skipped; a job that would
    /// end up with no destinations is rejected.
    pub fn create(
        input: CreateDeliveryJob,
        preset: &DeliveryPreset,
        registry: &[DeliveryDestination],
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        let destinations: Vec<_> = preset
            .destination_ids
            .iter()
            .filter_map(|id| registry.iter().find(|d| d.id == *id))
            .filter(|d| d.is_active)
            .map(DeliveryJobDestination::pending)
            .collect();

        if destinations.is_empty() {
            return Err(CoreError::Validation(format!(
                "Preset '{}' has no active destinations",
                preset.name
            )));
        }

        let id = new_id();
        let asset_name = input
            .asset_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_ASSET_NAME.to_string());
        let asset_id = input
            .asset_id
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| format!("asset-{}", &id.simple().to_string()[..8]));

        Ok(Self {
            id,
            asset_id,
            asset_name,
            preset_id: preset.id,
            preset_name: preset.name.clone(),
            destinations,
            status: JobStatus::Queued,
            progress: 0,
            created_at: now,
            started_at: None,
            completed_at: None,
            scheduled_for: preset.scheduled_for(now),
            retry_count: 0,
            error: None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Requeue a failed job.
    ///
    /// Clears the error, bumps `retry_count`, and resets progress and every
    /// destination so the simulator replays the full pipeline.
    pub fn retry(&mut self) -> Result<(), CoreError> {
        if self.status != JobStatus::Failed {
            return Err(self.invalid("retry"));
        }
        self.status = JobStatus::Queued;
        self.error = None;
        self.retry_count += 1;
        self.progress = 0;
        self.started_at = None;
        self.completed_at = None;
        self.destinations.iter_mut().for_each(DeliveryJobDestination::reset);
        Ok(())
    }

    /// Cancel a queued or delivering job.
    ///
    /// Jobs in `processing` are rejected; that window is not cancellable.
    pub fn cancel(&mut self) -> Result<(), CoreError> {
        match self.status {
            JobStatus::Queued | JobStatus::Delivering => {
                self.status = JobStatus::Cancelled;
                Ok(())
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    /// Fail a non-terminal job with a user-visible reason.
    ///
    /// Destinations that had not completed are marked failed with the same
    /// reason.
    pub fn fail(&mut self, reason: &str) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(self.invalid("fail"));
        }
        let reason = if reason.trim().is_empty() {
            "Delivery failed".to_string()
        } else {
            reason.trim().to_string()
        };
        for dest in &mut self.destinations {
            if dest.status != DestinationStatus::Completed {
                dest.status = DestinationStatus::Failed;
                dest.error = Some(reason.clone());
            }
        }
        self.status = JobStatus::Failed;
        self.error = Some(reason);
        Ok(())
    }

    /// Whether the job has been retried past [`RETRY_GUIDANCE`].
    pub fn exceeds_retry_guidance(&self) -> bool {
        self.retry_count > RETRY_GUIDANCE
    }

    /// Whether the job was created before `now - retention`.
    pub fn is_expired(&self, now: Timestamp, retention: chrono::Duration) -> bool {
        self.created_at < now - retention
    }

    fn invalid(&self, action: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            action,
            status: self.status.name(),
        }
    }
}

/// Drop jobs older than `retention`, keeping the order of the rest.
///
/// Returns the number of jobs removed.
pub fn prune_expired(
    jobs: &mut Vec<DeliveryJob>,
    now: Timestamp,
    retention: chrono::Duration,
) -> usize {
    let before = jobs.len();
    jobs.retain(|job| !job.is_expired(now, retention));
    before - jobs.len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
