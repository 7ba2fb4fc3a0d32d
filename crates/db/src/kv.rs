//! Key-value store backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::DbError;

/// Key used by [`crate::health_check`].
pub const HEALTH_KEY: &str = "mediadesk.health";

/// A string-keyed blob store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value under `key`, or `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, DbError>;

    /// Replace the value under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<(), DbError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), DbError>;
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Stores each key as `<dir>/<key>.json`.
///
/// Each write goes to its own hidden sibling temp file, is synced, and is
/// then renamed over the target. Concurrent writers to one key never share
/// a temp path, and a crash mid-write leaves either the old or the new blob.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Open a store rooted at `dir`, creating it if missing.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, DbError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Opened file key-value store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DbError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if !valid {
            return Err(DbError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DbError> {
        let path = self.path_for(key)?;
        // Keys never start with '.', so temp names cannot shadow a key.
        let tmp = self
            .dir
            .join(format!(".{key}.json.{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_synced(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Ok(dir) = tokio::fs::File::open(&self.dir).await {
            let _ = dir.sync_all().await;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DbError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_synced(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(value.as_bytes()).await?;
    file.sync_all().await
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

/// Process-local store, used by tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DbError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
