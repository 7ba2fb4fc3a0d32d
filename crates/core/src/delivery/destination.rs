//! Delivery destinations: external endpoints a job can push content to.
//!
//! Destinations carry a platform type, an activation flag, and a free-form
//! connection config. The config is stored as-is; nothing here checks that
//! an endpoint is reachable or that credentials are valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::delivery::validate_name;
use crate::error::CoreError;
use crate::types::{new_id, EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Platform type
// ---------------------------------------------------------------------------

/// The platform a destination delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformType {
    Youtube,
    Vimeo,
    Facebook,
    Instagram,
    Tiktok,
    Twitter,
    Linkedin,
    FrameIo,
    AmazonS3,
    GoogleCloudStorage,
    AzureBlob,
    Dropbox,
    BoxCom,
    GoogleDrive,
    Ftp,
    Sftp,
}

impl PlatformType {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Youtube => "YouTube",
            Self::Vimeo => "Vimeo",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::Tiktok => "TikTok",
            Self::Twitter => "X / Twitter",
            Self::Linkedin => "LinkedIn",
            Self::FrameIo => "Frame.io",
            Self::AmazonS3 => "Amazon S3",
            Self::GoogleCloudStorage => "Google Cloud Storage",
            Self::AzureBlob => "Azure Blob Storage",
            Self::Dropbox => "Dropbox",
            Self::BoxCom => "Box",
            Self::GoogleDrive => "Google Drive",
            Self::Ftp => "FTP",
            Self::Sftp => "SFTP",
        }
    }

    /// Whether the platform is a file/object store rather than a publishing
    /// platform.
    pub fn is_storage(self) -> bool {
        matches!(
            self,
            Self::AmazonS3
                | Self::GoogleCloudStorage
                | Self::AzureBlob
                | Self::Dropbox
                | Self::BoxCom
                | Self::GoogleDrive
                | Self::Ftp
                | Self::Sftp
        )
    }

    /// Build the synthetic URL a completed delivery reports.
    ///
    /// The token is derived from the job id and the destination's slot in
    /// the job, so two destinations on the same platform get distinct URLs.
    pub fn delivered_url(self, job_id: EntityId, slot: usize) -> String {
        let token = format!("{}{slot}", &job_id.simple().to_string()[..10]);
        match self {
            Self::Youtube => format!("https://youtube.com/watch?v={token}"),
            Self::Vimeo => format!("https://vimeo.com/{token}"),
            Self::Facebook => format!("https://facebook.com/watch/?v={token}"),
            Self::Instagram => format!("https://instagram.com/reel/{token}"),
            Self::Tiktok => format!("https://tiktok.com/video/{token}"),
            Self::Twitter => format!("https://x.com/i/status/{token}"),
            Self::Linkedin => format!("https://linkedin.com/feed/update/{token}"),
            Self::FrameIo => format!("https://app.frame.io/reviews/{token}"),
            Self::AmazonS3 => format!("s3://deliveries/{job_id}/{token}"),
            Self::GoogleCloudStorage => format!("gs://deliveries/{job_id}/{token}"),
            Self::AzureBlob => {
                format!("https://deliveries.blob.core.windows.net/{job_id}/{token}")
            }
            Self::Dropbox => format!("https://dropbox.com/s/{token}"),
            Self::BoxCom => format!("https://app.box.com/s/{token}"),
            Self::GoogleDrive => format!("https://drive.google.com/file/d/{token}"),
            Self::Ftp => format!("ftp://deliveries/{job_id}/{token}"),
            Self::Sftp => format!("sftp://deliveries/{job_id}/{token}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Free-form connection settings. All values are opaque placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Reference to a credential held elsewhere; never a secret itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// A delivery endpoint in the destination registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDestination {
    pub id: EntityId,
    pub name: String,
    pub platform: PlatformType,
    pub is_active: bool,
    #[serde(default)]
    pub config: DestinationConfig,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a destination.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDestination {
    pub name: String,
    pub platform: PlatformType,
    pub is_active: Option<bool>,
    pub config: Option<DestinationConfig>,
}

/// DTO for editing a destination. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDestination {
    pub name: Option<String>,
    pub platform: Option<PlatformType>,
    pub config: Option<DestinationConfig>,
}

impl DeliveryDestination {
    /// Build a new destination from user input. New destinations are active
    /// unless the input says otherwise.
    pub fn create(input: CreateDestination, now: Timestamp) -> Result<Self, CoreError> {
        validate_name("Destination", &input.name)?;
        Ok(Self {
            id: new_id(),
            name: input.name.trim().to_string(),
            platform: input.platform,
            is_active: input.is_active.unwrap_or(true),
            config: input.config.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an edit in place.
    pub fn apply_update(&mut self, input: UpdateDestination, now: Timestamp) -> Result<(), CoreError> {
        if let Some(name) = input.name {
            validate_name("Destination", &name)?;
            self.name = name.trim().to_string();
        }
        if let Some(platform) = input.platform {
            self.platform = platform;
        }
        if let Some(config) = input.config {
            self.config = config;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Flip the activation flag and return the new value.
    pub fn toggle_active(&mut self, now: Timestamp) -> bool {
        self.is_active = !self.is_active;
        self.updated_at = now;
        self.is_active
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn youtube() -> CreateDestination {
        CreateDestination {
            name: "  Main Channel ".to_string(),
            platform: PlatformType::Youtube,
            is_active: None,
            config: None,
        }
    }

    #[test]
    fn sixteen_platforms_by_serialized_name() {
        let names = [
            "youtube",
            "vimeo",
            "facebook",
            "instagram",
            "tiktok",
            "twitter",
            "linkedin",
            "frame_io",
            "amazon_s3",
            "google_cloud_storage",
            "azure_blob",
            "dropbox",
            "box_com",
            "google_drive",
            "ftp",
            "sftp",
        ];
        for name in names {
            let platform: PlatformType = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(serde_json::to_value(platform).unwrap(), name);
        }
        assert!(serde_json::from_value::<PlatformType>(serde_json::json!("myspace")).is_err());
    }

    #[test]
    fn platform_name_matches_serde() {
        let json = serde_json::to_string(&PlatformType::GoogleCloudStorage).unwrap();
        assert_eq!(json, "\"google_cloud_storage\"");
    }

    #[test]
    fn storage_platforms() {
        assert!(PlatformType::AmazonS3.is_storage());
        assert!(PlatformType::Sftp.is_storage());
        assert!(!PlatformType::Youtube.is_storage());
    }

    #[test]
    fn delivered_urls_differ_per_slot() {
        let job_id = new_id();
        let a = PlatformType::Vimeo.delivered_url(job_id, 0);
        let b = PlatformType::Vimeo.delivered_url(job_id, 1);
        assert!(a.starts_with("https://vimeo.com/"));
        assert_ne!(a, b);
    }

    #[test]
    fn create_trims_name_and_defaults_active() {
        let dest = DeliveryDestination::create(youtube(), Utc::now()).unwrap();
        assert_eq!(dest.name, "Main Channel");
        assert!(dest.is_active);
        assert_eq!(dest.config, DestinationConfig::default());
    }

    #[test]
    fn create_rejects_empty_name() {
        let mut input = youtube();
        input.name = String::new();
        assert!(DeliveryDestination::create(input, Utc::now()).is_err());
    }

    #[test]
    fn update_changes_only_given_fields() {
        let mut dest = DeliveryDestination::create(youtube(), Utc::now()).unwrap();
        let config = DestinationConfig {
            bucket: Some("masters".to_string()),
            ..Default::default()
        };
        dest.apply_update(
            UpdateDestination {
                config: Some(config.clone()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(dest.name, "Main Channel");
        assert_eq!(dest.config, config);
    }

    #[test]
    fn toggle_flips_activation() {
        let mut dest = DeliveryDestination::create(youtube(), Utc::now()).unwrap();
        assert!(!dest.toggle_active(Utc::now()));
        assert!(dest.toggle_active(Utc::now()));
    }

    #[test]
    fn config_omits_empty_fields() {
        let json = serde_json::to_value(DestinationConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
