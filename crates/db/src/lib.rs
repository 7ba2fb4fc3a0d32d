//! Key-value blob persistence for the delivery backend.
//!
//! Each registry (jobs, destinations, presets) is stored as one serialized
//! JSON array under a fixed key. Writes replace the whole blob.

pub mod error;
pub mod kv;
pub mod repositories;

pub use error::DbError;
pub use kv::{FileKvStore, KvStore, MemoryKvStore};

/// Shared handle to a key-value store.
pub type KvHandle = std::sync::Arc<dyn KvStore>;

/// Open the file-backed store rooted at `data_dir`, creating the directory
/// if needed.
pub async fn open_store(data_dir: impl Into<std::path::PathBuf>) -> Result<KvHandle, DbError> {
    let store = FileKvStore::open(data_dir).await?;
    Ok(std::sync::Arc::new(store))
}

/// Check that the store accepts reads and writes.
pub async fn health_check(store: &dyn KvStore) -> Result<(), DbError> {
    store.put(kv::HEALTH_KEY, "ok").await?;
    store.get(kv::HEALTH_KEY).await?;
    Ok(())
}
