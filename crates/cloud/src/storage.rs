//! Object storage: retrieval URLs for opaque storage keys.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;

use crate::error::CloudError;

/// Produces time-limited retrieval URLs. The backend never streams bytes.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// URL from which `key` can be fetched for roughly `ttl`.
    async fn retrieval_url(&self, key: &str, ttl: Duration) -> Result<String, CloudError>;
}

fn validate_key(key: &str) -> Result<&str, CloudError> {
    let key = key.trim().trim_start_matches('/');
    if key.is_empty() || key.split('/').any(|part| part == "..") {
        return Err(CloudError::InvalidKey(key.to_string()));
    }
    Ok(key)
}

// ---------------------------------------------------------------------------
// S3
// ---------------------------------------------------------------------------

/// S3 presigned `GetObject` URLs.
pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStorage {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the default AWS credential chain for `region`.
    pub async fn from_env(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let config = aws_config::from_env()
            .region(aws_sdk_s3::config::Region::new(region.into()))
            .load()
            .await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket)
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn retrieval_url(&self, key: &str, ttl: Duration) -> Result<String, CloudError> {
        let key = validate_key(key)?;
        let presign =
            PresigningConfig::expires_in(ttl).map_err(|e| CloudError::Presign(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign)
            .await
            .map_err(|e| CloudError::Presign(e.to_string()))?;
        Ok(request.uri().to_string())
    }
}

// ---------------------------------------------------------------------------
// Static base URL
// ---------------------------------------------------------------------------

/// Joins keys onto a fixed public base URL and stamps an expiry.
///
/// Used for local runs and tests where no bucket is configured.
pub struct StaticObjectStorage {
    base_url: String,
}

impl StaticObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for StaticObjectStorage {
    async fn retrieval_url(&self, key: &str, ttl: Duration) -> Result<String, CloudError> {
        let key = validate_key(key)?;
        let expires = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("{}/{key}?expires={expires}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn static_urls_join_base_and_key() {
        let storage = StaticObjectStorage::new("http://localhost:3000/files/");
        let url = storage
            .retrieval_url("/thumbs/a.jpg", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:3000/files/thumbs/a.jpg?expires="));
    }

    #[tokio::test]
    async fn rejects_empty_and_traversal_keys() {
        let storage = StaticObjectStorage::new("http://localhost");
        for key in ["", "  ", "a/../b"] {
            assert_matches!(
                storage.retrieval_url(key, Duration::from_secs(1)).await,
                Err(CloudError::InvalidKey(_))
            );
        }
    }
}
