/// All entity identifiers are random v4 UUIDs generated at creation.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh entity identifier.
pub fn new_id() -> EntityId {
    uuid::Uuid::new_v4()
}
