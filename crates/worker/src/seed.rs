//! Registry contents used when nothing has been persisted yet.

use mediadesk_core::delivery::destination::{
    CreateDestination, DeliveryDestination, DestinationConfig, PlatformType,
};
use mediadesk_core::delivery::preset::{
    CreatePreset, DeliveryPreset, NotificationSettings, OutputFormat,
};
use mediadesk_core::error::CoreError;
use mediadesk_core::types::Timestamp;

/// Name of the seeded social preset. It is created first, so jobs without
/// an explicit preset use it.
pub const SOCIAL_PRESET_NAME: &str = "Social Media Blast";

/// Name of the seeded storage preset.
pub const ARCHIVE_PRESET_NAME: &str = "Archive Backup";

/// Default destinations: two publishing platforms and two storage targets.
pub fn default_destinations(now: Timestamp) -> Result<Vec<DeliveryDestination>, CoreError> {
    let seeds = [
        ("YouTube Channel", PlatformType::Youtube, DestinationConfig::default()),
        ("Vimeo Showcase", PlatformType::Vimeo, DestinationConfig::default()),
        (
            "Archive Bucket",
            PlatformType::AmazonS3,
            DestinationConfig {
                bucket: Some("media-archive".to_string()),
                region: Some("us-east-1".to_string()),
                ..Default::default()
            },
        ),
        (
            "Broadcast FTP",
            PlatformType::Ftp,
            DestinationConfig {
                endpoint: Some("ftp://ftp.example.com".to_string()),
                path: Some("/incoming".to_string()),
                ..Default::default()
            },
        ),
    ];

    seeds
        .into_iter()
        .map(|(name, platform, config)| {
            DeliveryDestination::create(
                CreateDestination {
                    name: name.to_string(),
                    platform,
                    is_active: Some(true),
                    config: Some(config),
                },
                now,
            )
        })
        .collect()
}

/// Default presets built from whatever destinations exist.
///
/// Publishing platforms go to the social preset, storage targets to the
/// archive preset. A preset with no matching destinations is skipped.
pub fn default_presets(
    destinations: &[DeliveryDestination],
    now: Timestamp,
) -> Result<Vec<DeliveryPreset>, CoreError> {
    let ids = |storage: bool| {
        destinations
            .iter()
            .filter(|d| d.platform.is_storage() == storage)
            .map(|d| d.id)
            .collect::<Vec<_>>()
    };

    let social = CreatePreset {
        name: SOCIAL_PRESET_NAME.to_string(),
        description: Some("Publish to every connected social platform".to_string()),
        destination_ids: ids(false),
        output_format: Some(OutputFormat::default()),
        schedule: None,
        notifications: Some(NotificationSettings {
            on_complete: true,
            on_failure: true,
            ..Default::default()
        }),
        compliance: None,
        is_default: Some(true),
    };
    let archive = CreatePreset {
        name: ARCHIVE_PRESET_NAME.to_string(),
        description: Some("Mezzanine copy to long-term storage".to_string()),
        destination_ids: ids(true),
        output_format: Some(OutputFormat {
            container: "mov".to_string(),
            video_codec: "prores".to_string(),
            audio_codec: "pcm".to_string(),
            resolution: "3840x2160".to_string(),
            bitrate_kbps: None,
            frame_rate: Some(24.0),
        }),
        schedule: None,
        notifications: None,
        compliance: None,
        is_default: Some(false),
    };

    [social, archive]
        .into_iter()
        .filter(|p| !p.destination_ids.is_empty())
        .map(|p| DeliveryPreset::create(p, destinations, now))
        .collect()
}
