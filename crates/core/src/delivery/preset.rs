//! Delivery presets: reusable bundles of destinations and policy settings.
//!
//! A preset is read at job-creation time and copied into the job; later
//! edits to the preset never touch existing jobs.

use serde::{Deserialize, Serialize};

use crate::delivery::destination::DeliveryDestination;
use crate::delivery::{validate_description, validate_name};
use crate::error::CoreError;
use crate::types::{new_id, EntityId, Timestamp};

/* --------------------------------------------------------------------------
   Output format
   -------------------------------------------------------------------------- */

/// Supported container formats.
pub const VALID_CONTAINERS: &[&str] = &["mp4", "mov", "mxf", "webm", "mkv"];

/// Target encoding for the delivered rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub container: String,
    pub video_codec: String,
    pub audio_codec: String,
    /// `WIDTHxHEIGHT`, e.g. `1920x1080`.
    pub resolution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f32>,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            container: "mp4".to_string(),
            video_codec: "h264".to_string(),
            audio_codec: "aac".to_string(),
            resolution: "1920x1080".to_string(),
            bitrate_kbps: None,
            frame_rate: None,
        }
    }
}

/// Validate an output format: known container and a `WxH` resolution with
/// positive dimensions.
pub fn validate_output_format(format: &OutputFormat) -> Result<(), CoreError> {
    if !VALID_CONTAINERS.contains(&format.container.as_str()) {
        return Err(CoreError::Validation(format!(
            "Invalid container '{}'. Must be one of: {}",
            format.container,
            VALID_CONTAINERS.join(", ")
        )));
    }

    let dims = format
        .resolution
        .split_once('x')
        .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)));
    match dims {
        Some((w, h)) if w > 0 && h > 0 => {}
        _ => {
            return Err(CoreError::Validation(format!(
                "Invalid resolution '{}'. Expected WIDTHxHEIGHT",
                format.resolution
            )))
        }
    }

    if let Some(fps) = format.frame_rate {
        if !(fps > 0.0 && fps <= 240.0) {
            return Err(CoreError::Validation(format!(
                "Frame rate must be between 0 and 240, got {fps}"
            )));
        }
    }
    Ok(())
}

/* --------------------------------------------------------------------------
   Schedule, notifications, compliance
   -------------------------------------------------------------------------- */

/// When jobs created from the preset should start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliverySchedule {
    Immediate,
    Once { at: Timestamp },
}

/// Which lifecycle changes produce an outbound notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub on_start: bool,
    #[serde(default)]
    pub on_complete: bool,
    #[serde(default)]
    pub on_failure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl NotificationSettings {
    /// Webhook to notify for the given job event, if any.
    pub fn webhook_for(&self, event_type: &str) -> Option<&str> {
        use crate::job_events::{EVENT_JOB_COMPLETED, EVENT_JOB_FAILED, EVENT_JOB_STARTED};

        let wanted = match event_type {
            EVENT_JOB_STARTED => self.on_start,
            EVENT_JOB_COMPLETED => self.on_complete,
            EVENT_JOB_FAILED => self.on_failure,
            _ => false,
        };
        if wanted {
            self.webhook_url.as_deref()
        } else {
            None
        }
    }
}

/// Validate that a webhook URL, if present, is http(s).
pub fn validate_webhook_url(url: Option<&str>) -> Result<(), CoreError> {
    match url.map(str::trim) {
        None => Ok(()),
        Some(u) if u.starts_with("http://") || u.starts_with("https://") => Ok(()),
        Some(u) => Err(CoreError::Validation(format!(
            "Webhook URL must start with http:// or https://, got: '{u}'"
        ))),
    }
}

/// Compliance requirements recorded with the preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFlags {
    #[serde(default)]
    pub require_captions: bool,
    #[serde(default)]
    pub require_content_rating: bool,
    #[serde(default)]
    pub include_watermark: bool,
    /// ISO country codes the content must not be delivered to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geo_restrictions: Vec<String>,
}

/* --------------------------------------------------------------------------
   Preset
   -------------------------------------------------------------------------- */

/// A named, reusable delivery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPreset {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub destination_ids: Vec<EntityId>,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<DeliverySchedule>,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub compliance: ComplianceFlags,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a preset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePreset {
    pub name: String,
    pub description: Option<String>,
    pub destination_ids: Vec<EntityId>,
    pub output_format: Option<OutputFormat>,
    pub schedule: Option<DeliverySchedule>,
    pub notifications: Option<NotificationSettings>,
    pub compliance: Option<ComplianceFlags>,
    pub is_default: Option<bool>,
}

/// DTO for editing a preset. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub destination_ids: Option<Vec<EntityId>>,
    pub output_format: Option<OutputFormat>,
    pub schedule: Option<DeliverySchedule>,
    pub notifications: Option<NotificationSettings>,
    pub compliance: Option<ComplianceFlags>,
    pub is_default: Option<bool>,
}

/// Validate that a destination list is non-empty, has no duplicates, and
/// only names destinations that exist in `registry`.
pub fn validate_destination_refs(
    ids: &[EntityId],
    registry: &[DeliveryDestination],
) -> Result<(), CoreError> {
    if ids.is_empty() {
        return Err(CoreError::Validation(
            "Preset must include at least one destination".to_string(),
        ));
    }
    for (i, id) in ids.iter().enumerate() {
        if ids[..i].contains(id) {
            return Err(CoreError::Validation(format!(
                "Destination {id} is listed more than once"
            )));
        }
        if !registry.iter().any(|d| d.id == *id) {
            return Err(CoreError::NotFound {
                entity: "DeliveryDestination",
                id: *id,
            });
        }
    }
    Ok(())
}

impl DeliveryPreset {
    /// Build a new preset, validating it against the destination registry.
    pub fn create(
        input: CreatePreset,
        registry: &[DeliveryDestination],
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        validate_name("Preset", &input.name)?;
        validate_description(input.description.as_deref())?;
        validate_destination_refs(&input.destination_ids, registry)?;

        let output_format = input.output_format.unwrap_or_default();
        validate_output_format(&output_format)?;

        let notifications = input.notifications.unwrap_or_default();
        validate_webhook_url(notifications.webhook_url.as_deref())?;

        Ok(Self {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: input.description,
            destination_ids: input.destination_ids,
            output_format,
            schedule: input.schedule,
            notifications,
            compliance: input.compliance.unwrap_or_default(),
            is_default: input.is_default.unwrap_or(false),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an edit in place. The preset is left untouched when validation
    /// fails.
    pub fn apply_update(
        &mut self,
        input: UpdatePreset,
        registry: &[DeliveryDestination],
        now: Timestamp,
    ) -> Result<(), CoreError> {
        if let Some(ref name) = input.name {
            validate_name("Preset", name)?;
        }
        validate_description(input.description.as_deref())?;
        if let Some(ref ids) = input.destination_ids {
            validate_destination_refs(ids, registry)?;
        }
        if let Some(ref format) = input.output_format {
            validate_output_format(format)?;
        }
        if let Some(ref n) = input.notifications {
            validate_webhook_url(n.webhook_url.as_deref())?;
        }

        if let Some(name) = input.name {
            self.name = name.trim().to_string();
        }
        if input.description.is_some() {
            self.description = input.description;
        }
        if let Some(ids) = input.destination_ids {
            self.destination_ids = ids;
        }
        if let Some(format) = input.output_format {
            self.output_format = format;
        }
        if input.schedule.is_some() {
            self.schedule = input.schedule;
        }
        if let Some(n) = input.notifications {
            self.notifications = n;
        }
        if let Some(c) = input.compliance {
            self.compliance = c;
        }
        if let Some(d) = input.is_default {
            self.is_default = d;
        }
        self.updated_at = now;
        Ok(())
    }

    /// The instant a job created at `now` should wait for, if the schedule
    /// points into the future.
    pub fn scheduled_for(&self, now: Timestamp) -> Option<Timestamp> {
        match self.schedule {
            Some(DeliverySchedule::Once { at }) if at > now => Some(at),
            _ => None,
        }
    }
}

/// Resolve the preset a new job should use.
///
/// An explicit id must exist. Without one, the first preset in the registry
/// is used; an empty registry is a validation error.
pub fn resolve_preset(
    presets: &[DeliveryPreset],
    preset_id: Option<EntityId>,
) -> Result<&DeliveryPreset, CoreError> {
    match preset_id {
        Some(id) => presets.iter().find(|p| p.id == id).ok_or(CoreError::NotFound {
            entity: "DeliveryPreset",
            id,
        }),
        None => presets.first().ok_or_else(|| {
            CoreError::Validation("No delivery presets are configured".to_string())
        }),
    }
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */
