//! Repository layer: one zero-sized struct per persisted registry.
//!
//! Each repository reads and writes a whole JSON array under a fixed key.
//! A blob that fails to decode is logged and treated as absent.

pub mod destination_repo;
pub mod job_repo;
pub mod preset_repo;

pub use destination_repo::DestinationRepo;
pub use job_repo::JobRepo;
pub use preset_repo::PresetRepo;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DbError;
use crate::kv::KvStore;

/// Read and decode the list under `key`.
///
/// Returns `Ok(None)` when the key was never written or the stored blob no
/// longer decodes. Only storage I/O errors are returned as `Err`.
pub(crate) async fn load_list<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<Vec<T>>, DbError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(items) => Ok(Some(items)),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding undecodable blob");
            Ok(None)
        }
    }
}

/// Encode and write the full list under `key`.
pub(crate) async fn save_list<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    items: &[T],
) -> Result<(), DbError> {
    let raw = serde_json::to_string(items)?;
    store.put(key, &raw).await
}
