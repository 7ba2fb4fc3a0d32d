//! Delivery domain: destinations, presets, jobs and the progress simulation.
//!
//! ```text
//! DeliveryDestination  <--  DeliveryPreset.destination_ids
//!         |                          |
//!         +---- snapshot ----> DeliveryJob.destinations
//!                                    |
//!                      simulation::advance (one tick)
//! ```

pub mod destination;
pub mod job;
pub mod preset;
pub mod simulation;

use crate::error::CoreError;

/* --------------------------------------------------------------------------
   Shared validation limits
   -------------------------------------------------------------------------- */

/// Maximum length for destination and preset names.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length for a preset description.
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Validate a display name: non-blank and within [`MAX_NAME_LEN`].
///
/// `kind` is used in the error message (e.g. "Destination", "Preset").
pub fn validate_name(kind: &str, name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "{kind} name must not be empty"
        )));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{kind} name too long: {} chars (max {MAX_NAME_LEN})",
            name.len()
        )));
    }
    Ok(())
}

/// Validate an optional description against [`MAX_DESCRIPTION_LEN`].
pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.len() > MAX_DESCRIPTION_LEN => Err(CoreError::Validation(format!(
            "Description too long: {} chars (max {MAX_DESCRIPTION_LEN})",
            d.len()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_name_accepts_valid() {
        assert!(validate_name("Preset", "Social Media Blast").is_ok());
    }

    #[test]
    fn validate_name_rejects_blank() {
        let err = validate_name("Destination", "   ").unwrap_err();
        assert!(err.to_string().contains("Destination name must not be empty"));
    }

    #[test]
    fn validate_name_rejects_too_long() {
        let err = validate_name("Preset", &"x".repeat(MAX_NAME_LEN + 1)).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn validate_description_limits() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some("short")).is_ok());
        assert!(validate_description(Some(&"d".repeat(MAX_DESCRIPTION_LEN + 1))).is_err());
    }
}
