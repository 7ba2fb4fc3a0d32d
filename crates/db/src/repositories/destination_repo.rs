//! Persistence for the destination registry.

use mediadesk_core::delivery::destination::DeliveryDestination;

use crate::error::DbError;
use crate::kv::KvStore;

/// Storage key of the destination registry.
pub const DESTINATIONS_KEY: &str = "mediadesk.delivery.destinations";

/// Loads and saves the destination registry.
pub struct DestinationRepo;

impl DestinationRepo {
    /// Load the registry. `None` means nothing usable was persisted and the
    /// caller should seed defaults.
    pub async fn load(store: &dyn KvStore) -> Result<Option<Vec<DeliveryDestination>>, DbError> {
        super::load_list(store, DESTINATIONS_KEY).await
    }

    pub async fn save(
        store: &dyn KvStore,
        destinations: &[DeliveryDestination],
    ) -> Result<(), DbError> {
        super::save_list(store, DESTINATIONS_KEY, destinations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use chrono::Utc;
    use mediadesk_core::delivery::destination::{CreateDestination, PlatformType};

    #[tokio::test]
    async fn round_trip_and_empty_registry() {
        let store = MemoryKvStore::new();
        assert!(DestinationRepo::load(&store).await.unwrap().is_none());

        let dest = DeliveryDestination::create(
            CreateDestination {
                name: "Masters bucket".to_string(),
                platform: PlatformType::AmazonS3,
                is_active: Some(false),
                config: None,
            },
            Utc::now(),
        )
        .unwrap();
        DestinationRepo::save(&store, &[dest.clone()]).await.unwrap();
        assert_eq!(DestinationRepo::load(&store).await.unwrap(), Some(vec![dest]));

        // An explicitly empty registry is kept, not reseeded.
        DestinationRepo::save(&store, &[]).await.unwrap();
        assert_eq!(DestinationRepo::load(&store).await.unwrap(), Some(vec![]));
    }
}
