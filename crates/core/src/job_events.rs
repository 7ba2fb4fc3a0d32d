//! Event names and WebSocket message types for delivery job updates.
//!
//! Event names are published on the in-process event bus by the delivery
//! service; the API relay maps them onto the `MSG_TYPE_*` values it sends to
//! connected WebSocket clients.

/// A job was appended to the store in `queued` state.
pub const EVENT_JOB_CREATED: &str = "delivery.job.created";
/// The simulator moved a job from `queued` to `processing`.
pub const EVENT_JOB_STARTED: &str = "delivery.job.started";
/// Overall or per-destination progress changed.
pub const EVENT_JOB_PROGRESS: &str = "delivery.job.progress";
/// Every destination reported completion.
pub const EVENT_JOB_COMPLETED: &str = "delivery.job.completed";
/// The job was failed by an external action.
pub const EVENT_JOB_FAILED: &str = "delivery.job.failed";
/// The job was cancelled by the user.
pub const EVENT_JOB_CANCELLED: &str = "delivery.job.cancelled";
/// A failed job was requeued.
pub const EVENT_JOB_RETRIED: &str = "delivery.job.retried";

/// A destination was created, edited, toggled or removed.
pub const EVENT_DESTINATION_CHANGED: &str = "delivery.destination.changed";
/// A preset was created, edited or removed.
pub const EVENT_PRESET_CHANGED: &str = "delivery.preset.changed";

/// Job snapshot update (created, started, progress, retried).
pub const MSG_TYPE_JOB_UPDATED: &str = "job_updated";
/// Job completed successfully.
pub const MSG_TYPE_JOB_COMPLETED: &str = "job_completed";
/// Job failed with an error.
pub const MSG_TYPE_JOB_FAILED: &str = "job_failed";
/// Job was cancelled.
pub const MSG_TYPE_JOB_CANCELLED: &str = "job_cancelled";

/// Map a job event name onto the WebSocket message type sent to clients.
///
/// Returns `None` for events that are not job lifecycle events.
pub fn message_type_for(event_type: &str) -> Option<&'static str> {
    match event_type {
        EVENT_JOB_COMPLETED => Some(MSG_TYPE_JOB_COMPLETED),
        EVENT_JOB_FAILED => Some(MSG_TYPE_JOB_FAILED),
        EVENT_JOB_CANCELLED => Some(MSG_TYPE_JOB_CANCELLED),
        EVENT_JOB_CREATED | EVENT_JOB_STARTED | EVENT_JOB_PROGRESS | EVENT_JOB_RETRIED => {
            Some(MSG_TYPE_JOB_UPDATED)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_job_event_has_a_message_type() {
        let events = [
            EVENT_JOB_CREATED,
            EVENT_JOB_STARTED,
            EVENT_JOB_PROGRESS,
            EVENT_JOB_COMPLETED,
            EVENT_JOB_FAILED,
            EVENT_JOB_CANCELLED,
            EVENT_JOB_RETRIED,
        ];
        for event in events {
            assert!(message_type_for(event).is_some(), "{event} has no message type");
        }
    }

    #[test]
    fn terminal_events_map_to_dedicated_types() {
        assert_eq!(message_type_for(EVENT_JOB_COMPLETED), Some(MSG_TYPE_JOB_COMPLETED));
        assert_eq!(message_type_for(EVENT_JOB_FAILED), Some(MSG_TYPE_JOB_FAILED));
        assert_eq!(message_type_for(EVENT_JOB_CANCELLED), Some(MSG_TYPE_JOB_CANCELLED));
    }

    #[test]
    fn registry_events_are_not_relayed() {
        assert_eq!(message_type_for(EVENT_PRESET_CHANGED), None);
        assert_eq!(message_type_for(EVENT_DESTINATION_CHANGED), None);
    }
}
