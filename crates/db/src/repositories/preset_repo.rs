//! Persistence for the preset registry.

use mediadesk_core::delivery::preset::DeliveryPreset;

use crate::error::DbError;
use crate::kv::KvStore;

/// Storage key of the preset registry.
pub const PRESETS_KEY: &str = "mediadesk.delivery.presets";

/// Loads and saves the preset registry.
pub struct PresetRepo;

impl PresetRepo {
    /// Load the registry. `None` means nothing usable was persisted.
    pub async fn load(store: &dyn KvStore) -> Result<Option<Vec<DeliveryPreset>>, DbError> {
        super::load_list(store, PRESETS_KEY).await
    }

    pub async fn save(store: &dyn KvStore, presets: &[DeliveryPreset]) -> Result<(), DbError> {
        super::save_list(store, PRESETS_KEY, presets).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    #[tokio::test]
    async fn corrupt_registry_reads_as_absent() {
        let store = MemoryKvStore::new();
        store.put(PRESETS_KEY, "[{\"id\": 1}]").await.unwrap();
        assert!(PresetRepo::load(&store).await.unwrap().is_none());
    }
}
